//! Exponential smoothing of the raw reading.

use crate::fixed_point::ema_step;

/// Default smoothing factor; `alpha / 256` is the weight of a new sample.
pub const DEFAULT_ALPHA: u8 = 200;

/// Exponentially smoothed copy of the raw reading, in the same fixed-point
/// domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoother {
    alpha: u8,
    value: i32,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl Smoother {
    pub fn new(alpha: u8) -> Self {
        Self { alpha, value: 0 }
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// An alpha of 128 weighs a new sample by 128/256 = 0.5.
    #[inline]
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha = alpha;
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Restart the filter at `raw` without smoothing.
    #[inline]
    pub fn seed(&mut self, raw: i32) {
        self.value = raw;
    }

    /// Fold `raw` into the smoothed value and return it.
    #[inline]
    pub fn update(&mut self, raw: i32) -> i32 {
        self.value = ema_step(self.value, raw, self.alpha);
        self.value
    }
}
