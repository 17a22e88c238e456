//! Settling-read gate.
//!
//! After a reset (power-up, gain change, timeout recovery) the chip needs a
//! few conversions before its output is stable: ~400 ms until the first
//! gain-128 reading, around six readings after switching to gain 64. The
//! gate counts full transfers and reports when the threshold is reached.

/// Default number of transfers before output is considered valid.
pub const DEFAULT_READS_UNTIL_VALID: u8 = 3;

/// Outcome of counting one successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Still below the threshold; the reading must not be reported.
    Settling,
    /// The threshold was reached by this transfer: first valid reading.
    JustSettled,
    /// The threshold had already been reached before this transfer.
    Steady,
}

/// Bounded counter in `[0, threshold]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlingGate {
    count: u8,
    threshold: u8,
}

impl Default for SettlingGate {
    fn default() -> Self {
        Self::new(DEFAULT_READS_UNTIL_VALID)
    }
}

impl SettlingGate {
    pub fn new(threshold: u8) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    #[inline]
    pub fn count(&self) -> u8 {
        self.count
    }

    #[inline]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Change the threshold. A count above the new threshold is clamped so
    /// the gate counts as settled rather than exceeding its bound.
    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
        self.count = self.count.min(threshold);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.count = 0;
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.count >= self.threshold
    }

    /// Count one successful transfer.
    pub fn advance(&mut self) -> Settle {
        if self.count < self.threshold {
            self.count += 1;
            if self.count < self.threshold {
                Settle::Settling
            } else {
                Settle::JustSettled
            }
        } else {
            Settle::Steady
        }
    }
}
