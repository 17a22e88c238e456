//! Capabilities injected into the HX711 acquisition state machine.
//!
//! The driver never touches hardware registers directly. It reads and drives
//! its two lines through [`Lines`] and takes every timing decision from a
//! [`Clock`], so tests can script line levels and advance time by hand.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Identifier of a single digital line (a GPIO number on most boards).
pub type LineId = u8;

/// Logic level observed on, or driven onto, a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Electrical mode a line is configured into before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Input,
    InputPullUp,
    Output,
}

/// Read, drive and configure digital lines.
///
/// `read`/`write` are infallible: once a line is configured, level access
/// cannot fail on any backend we target. Configuration can.
pub trait Lines {
    fn configure(
        &mut self,
        line: LineId,
        mode: LineMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn read(&mut self, line: LineId) -> Level;
    fn write(&mut self, line: LineId, level: Level);
}

impl<L: Lines + ?Sized> Lines for Box<L> {
    fn configure(
        &mut self,
        line: LineId,
        mode: LineMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).configure(line, mode)
    }

    #[inline]
    fn read(&mut self, line: LineId) -> Level {
        (**self).read(line)
    }

    #[inline]
    fn write(&mut self, line: LineId, level: Level) {
        (**self).write(line, level)
    }
}
