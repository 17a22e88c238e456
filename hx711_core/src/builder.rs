//! Type-state builder for `Hx711`.
//!
//! Lines and clock are type parameters: `build()` only exists once both were
//! supplied. Pins and settings are checked at `build()` time.

use hx711_traits::{Clock, LineId, Lines};

use crate::calibration::Calibration;
use crate::config::AcquisitionCfg;
use crate::core::Hx711;
use crate::error::{BuildError, Result};
use crate::gain::Gain;
use crate::protocol::Pins;

/// Placeholder for a capability not yet supplied to the builder.
#[derive(Debug, Default, Clone, Copy)]
pub struct Missing;

/// Builder for `Hx711`. All fields are validated on `build()`.
#[derive(Debug, Clone)]
pub struct Hx711Builder<L, C> {
    lines: L,
    clock: C,
    pins: Option<Pins>,
    cfg: AcquisitionCfg,
    calibration: Calibration,
}

impl Default for Hx711Builder<Missing, Missing> {
    fn default() -> Self {
        Self {
            lines: Missing,
            clock: Missing,
            pins: None,
            cfg: AcquisitionCfg::default(),
            calibration: Calibration::default(),
        }
    }
}

impl Hx711Builder<Missing, Missing> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L, C> Hx711Builder<L, C> {
    pub fn with_lines<L2: Lines>(self, lines: L2) -> Hx711Builder<L2, C> {
        Hx711Builder {
            lines,
            clock: self.clock,
            pins: self.pins,
            cfg: self.cfg,
            calibration: self.calibration,
        }
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> Hx711Builder<L, C2> {
        Hx711Builder {
            lines: self.lines,
            clock,
            pins: self.pins,
            cfg: self.cfg,
            calibration: self.calibration,
        }
    }

    pub fn with_pins(mut self, clock_line: LineId, data_line: LineId) -> Self {
        self.pins = Some(Pins {
            clock: clock_line,
            data: data_line,
        });
        self
    }

    /// Replace all acquisition settings at once (e.g. from a config file).
    pub fn with_config(mut self, cfg: AcquisitionCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_reads_until_valid(mut self, reads: u8) -> Self {
        self.cfg.reads_until_valid = reads;
        self
    }

    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.cfg.gain = gain;
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.cfg.alpha = alpha;
        self
    }

    pub fn with_busy_timeout_ms(mut self, ms: u32) -> Self {
        self.cfg.busy_timeout_ms = ms;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Restore a caller-persisted calibration if there is one; otherwise
    /// keep the defaults.
    pub fn apply_calibration<T: Into<Calibration>>(mut self, calibration: Option<T>) -> Self {
        if let Some(c) = calibration {
            self.calibration = c.into();
        }
        self
    }
}

impl<L: Lines, C: Clock> Hx711Builder<L, C> {
    /// Validate settings, configure the lines and return the driver.
    pub fn build(self) -> Result<Hx711<L, C>> {
        let pins = self
            .pins
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPins))?;
        if pins.clock == pins.data {
            return Err(eyre::Report::new(BuildError::SharedLine(pins.clock)));
        }
        if self.cfg.busy_timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "busy_timeout_ms must be >= 1",
            )));
        }
        if self.calibration.adjuster == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "adjuster must be non-zero",
            )));
        }
        Hx711::from_parts(self.lines, self.clock, pins, self.cfg, self.calibration)
    }
}
