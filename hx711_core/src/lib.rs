#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Non-blocking HX711 acquisition (hardware-agnostic).
//!
//! All line access goes through `hx711_traits::Lines` and all timing through
//! `hx711_traits::Clock`; nothing in this crate sleeps or spawns threads.
//!
//! ## Architecture
//!
//! - **Protocol**: 24-bit MSB-first transfer plus gain pulses (`protocol`)
//! - **State machine**: busy / timed-out / powered-down detection (`Hx711`)
//! - **Settling gate**: withholds `Valid` after resets (`settling`)
//! - **Smoothing**: integer exponential filter (`filter`)
//! - **Calibration**: tare offset and linear adjuster (`calibration`)
//!
//! ## Fixed-Point Readings
//!
//! Readings are `i32` holding the 24-bit sample in the upper 24 bits (the
//! ADC count × 256). See `fixed_point` for the assembly and filter math.

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod filter;
pub mod fixed_point;
pub mod gain;
pub mod hw_error;
pub mod mocks;
pub mod protocol;
pub mod settling;
pub mod status;
pub mod types;

pub use crate::builder::{Hx711Builder, Missing};
pub use crate::calibration::{Calibration, DEFAULT_ADJUSTER};
pub use crate::config::{AcquisitionCfg, DEFAULT_BUSY_TIMEOUT_MS};
pub use crate::core::Hx711;
pub use crate::error::{BuildError, Hx711Error};
pub use crate::gain::{Channel, Gain};
pub use crate::protocol::Pins;
pub use crate::status::Status;
pub use crate::types::Source;
