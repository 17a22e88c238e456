use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Monotonic millisecond clock.
///
/// - now_ms(): milliseconds since an arbitrary epoch, wrapping at `u32::MAX`
/// - ms_since(): wrapping elapsed time from an earlier `now_ms()` value
///
/// Wrapping is part of the contract: elapsed-time checks stay correct across
/// the ~49.7 day rollover as long as intervals are shorter than that.
pub trait Clock {
    fn now_ms(&self) -> u32;

    /// Milliseconds elapsed since `start`, wrapping on rollover.
    #[inline]
    fn ms_since(&self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Real-time clock backed by `std::time::Instant`, counting from creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // Truncation is the wrapping behaviour the trait promises.
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Deterministic clock whose time only moves when told to.
///
/// Clones share the same time source, so a simulator and the driver under
/// test can observe one timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary time, e.g. just below the rollover.
    pub fn starting_at(ms: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(ms)),
        }
    }

    /// Advance the clock by `ms`, wrapping on rollover.
    pub fn advance(&self, ms: u32) {
        let cur = self.now.load(Ordering::Relaxed);
        self.now.store(cur.wrapping_add(ms), Ordering::Relaxed);
    }

    /// Set the absolute time.
    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(250);
        assert_eq!(b.now_ms(), 250);
        b.set(7);
        assert_eq!(a.now_ms(), 7);
    }

    #[test]
    fn ms_since_wraps_across_rollover() {
        let clock = ManualClock::starting_at(u32::MAX - 99);
        let start = clock.now_ms();
        clock.advance(600);
        assert_eq!(clock.now_ms(), 500);
        assert_eq!(clock.ms_since(start), 600);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
