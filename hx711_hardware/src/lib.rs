//! Line backends for the HX711 driver.
//!
//! - `sim`: protocol-level chip simulator, always available
//! - `gpio`: Raspberry Pi GPIO through rppal (`hardware` feature, Linux)
pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use sim::{SimHandle, SimulatedHx711};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::RppalLines;
