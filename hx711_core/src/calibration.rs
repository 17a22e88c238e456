//! Tare offset and linear adjuster.
//!
//! `adjusted = (reading - tare) / adjuster`, all in integer arithmetic on
//! the fixed-point reading domain. Subtraction saturates instead of
//! wrapping on extreme inputs.

use crate::error::Hx711Error;

/// Adjuster used until the caller calibrates: one ADC count per unit.
pub const DEFAULT_ADJUSTER: i32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Baseline subtracted from readings (same domain as raw/smoothed).
    pub tare: i32,
    /// Linear divisor converting tared readings to engineering units.
    pub adjuster: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            tare: 0,
            adjuster: DEFAULT_ADJUSTER,
        }
    }
}

impl Calibration {
    #[inline]
    pub fn minus_tare(&self, reading: i32) -> i32 {
        reading.saturating_sub(self.tare)
    }

    /// Derive the adjuster so that `adjusted(reading) == target`.
    ///
    /// A zero target is coerced to 1: calibration degrades instead of
    /// failing on a division by zero.
    pub fn adjust_to(&mut self, reading: i32, target: i32) {
        let target = if target == 0 { 1 } else { target };
        self.adjuster = self.minus_tare(reading).saturating_div(target);
    }

    /// Tared reading divided by the adjuster.
    ///
    /// Fails with [`Hx711Error::ZeroAdjuster`] when the adjuster is zero,
    /// e.g. after `adjust_to` against a reading closer to the tare than the
    /// target value.
    pub fn adjusted(&self, reading: i32) -> Result<i32, Hx711Error> {
        if self.adjuster == 0 {
            return Err(Hx711Error::ZeroAdjuster);
        }
        Ok(self.minus_tare(reading).saturating_div(self.adjuster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_then_read_back_target() {
        let mut c = Calibration {
            tare: 1_000 * 256,
            ..Calibration::default()
        };
        let loaded = 51_000 * 256;
        c.adjust_to(loaded, 500);
        assert_eq!(c.adjuster, 100 * 256);
        assert_eq!(c.adjusted(loaded), Ok(500));
    }

    #[test]
    fn zero_target_is_coerced_to_one() {
        let mut c = Calibration {
            tare: 10,
            adjuster: 7,
        };
        c.adjust_to(1_010, 0);
        assert_eq!(c.adjuster, 1_000);
    }

    #[test]
    fn zero_adjuster_is_an_error() {
        let c = Calibration {
            tare: 0,
            adjuster: 0,
        };
        assert_eq!(c.adjusted(123), Err(Hx711Error::ZeroAdjuster));
        // raw minus tare does not involve the adjuster
        assert_eq!(c.minus_tare(123), 123);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let c = Calibration {
            tare: 0,
            adjuster: 256,
        };
        assert_eq!(c.adjusted(-257), Ok(-1));
        assert_eq!(c.adjusted(255), Ok(0));
    }

    #[test]
    fn extremes_saturate() {
        let c = Calibration {
            tare: i32::MAX,
            adjuster: -1,
        };
        assert_eq!(c.minus_tare(i32::MIN), i32::MIN);
        assert_eq!(c.adjusted(i32::MIN), Ok(i32::MAX));
    }
}
