//! Runtime acquisition settings.
//!
//! These are the values `Hx711` is built with. They are separate from the
//! TOML-deserialized config in `hx711_config`; see `conversions`.

use crate::filter::DEFAULT_ALPHA;
use crate::gain::Gain;
use crate::settling::DEFAULT_READS_UNTIL_VALID;

/// Busy time after which a conversion is declared timed out (ms).
///
/// Power-up, reset and gain change take ~400 ms at the 10 Hz output rate.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionCfg {
    /// Transfers after a reset before the output is reported valid.
    pub reads_until_valid: u8,
    /// Gain/channel for the next conversion.
    pub gain: Gain,
    /// Smoothing factor (`alpha / 256` per new sample).
    pub alpha: u8,
    /// Data line busy longer than this reports `Status::TimedOut`.
    pub busy_timeout_ms: u32,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            reads_until_valid: DEFAULT_READS_UNTIL_VALID,
            gain: Gain::Gain128,
            alpha: DEFAULT_ALPHA,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}
