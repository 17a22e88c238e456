//! Simulated HX711 behind the `Lines` capability.
//!
//! Models the chip at the protocol level so the real driver can run against
//! it unchanged:
//! - data line low once a conversion is ready, high while converting
//! - 24 bits shifted out MSB first on rising clock edges
//! - 1/2/3 trailing pulses select gain 128/32/64 for the next conversion
//! - a clock line the host observes high means power-down; driving it low
//!   again resets the chip to gain 128 and restarts settling
//!
//! Time comes from the injected `Clock`, so tests drive it with a
//! `ManualClock`.

use std::cell::Cell;
use std::rc::Rc;

use hx711_traits::{Clock, Level, LineId, LineMode, Lines};
use tracing::{debug, trace};

use crate::error::HwError;

/// Conversion period at the chip's 10 Hz output rate.
pub const CONVERSION_MS: u32 = 100;
/// First conversion after power-up or reset.
pub const POWER_UP_SETTLE_MS: u32 = 400;

const MAX_COUNTS: i32 = 0x7F_FFFF;
const MIN_COUNTS: i32 = -0x80_0000;

/// Shared knobs of a running simulator.
///
/// Clones refer to the same chip, so a test (or the CLI) can keep a handle
/// after moving the simulator into the driver.
#[derive(Debug, Clone)]
pub struct SimHandle {
    counts: Rc<Cell<i32>>,
    connected: Rc<Cell<bool>>,
}

impl SimHandle {
    fn new(counts: i32) -> Self {
        Self {
            counts: Rc::new(Cell::new(counts)),
            connected: Rc::new(Cell::new(true)),
        }
    }

    /// Bridge output at gain 128, as a signed ADC count. Clamped to the
    /// 24-bit range on conversion.
    pub fn set_counts(&self, counts: i32) {
        self.counts.set(counts);
    }

    pub fn counts(&self) -> i32 {
        self.counts.get()
    }

    /// A disconnected chip leaves the pulled-up data line high forever.
    pub fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }
}

pub struct SimulatedHx711<C: Clock> {
    clock: C,
    clock_line: LineId,
    data_line: LineId,
    sck: Level,
    powered_down: bool,
    // Trailing pulses latched for the current conversion (1..=3)
    gain_pulses: u8,
    conversion_started_ms: u32,
    conversion_len_ms: u32,
    conversion_ms: u32,
    settle_ms: u32,
    // Rising edges in the current transfer; 0 when idle
    pulses: u8,
    word: u32,
    configured: Vec<(LineId, LineMode)>,
    handle: SimHandle,
}

impl<C: Clock> std::fmt::Debug for SimulatedHx711<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHx711")
            .field("clock_line", &self.clock_line)
            .field("data_line", &self.data_line)
            .field("powered_down", &self.powered_down)
            .field("gain_pulses", &self.gain_pulses)
            .field("pulses", &self.pulses)
            .finish()
    }
}

impl<C: Clock> SimulatedHx711<C> {
    /// A freshly powered chip: the first conversion is ready after
    /// `POWER_UP_SETTLE_MS`.
    pub fn new(clock: C, clock_line: LineId, data_line: LineId) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            clock_line,
            data_line,
            sck: Level::Low,
            powered_down: false,
            gain_pulses: 1,
            conversion_started_ms: now,
            conversion_len_ms: POWER_UP_SETTLE_MS,
            conversion_ms: CONVERSION_MS,
            settle_ms: POWER_UP_SETTLE_MS,
            pulses: 0,
            word: 0,
            configured: Vec::new(),
            handle: SimHandle::new(0),
        }
    }

    /// Override conversion and power-up settle times (e.g. 80 Hz mode).
    pub fn with_timing(mut self, conversion_ms: u32, settle_ms: u32) -> Self {
        self.conversion_ms = conversion_ms;
        self.settle_ms = settle_ms;
        self.conversion_len_ms = settle_ms;
        self
    }

    pub fn with_counts(self, counts: i32) -> Self {
        self.handle.set_counts(counts);
        self
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Trailing pulse count latched by the last completed transfer.
    pub fn gain_pulses(&self) -> u8 {
        self.gain_pulses
    }

    pub fn configured(&self) -> &[(LineId, LineMode)] {
        &self.configured
    }

    fn is_ready(&self) -> bool {
        self.handle.connected.get()
            && !self.powered_down
            && self.clock.ms_since(self.conversion_started_ms) >= self.conversion_len_ms
    }

    /// Output word for the latched gain: the bridge signal scaled by
    /// gain/128 and clamped to 24 bits.
    fn sample_word(&self) -> u32 {
        let counts = i64::from(self.handle.counts());
        let scaled = match self.gain_pulses {
            3 => counts / 2,
            2 => counts / 4,
            _ => counts,
        };
        let clamped = scaled.clamp(i64::from(MIN_COUNTS), i64::from(MAX_COUNTS)) as i32;
        (clamped as u32) & 0x00FF_FFFF
    }

    fn data_level(&mut self) -> Level {
        if self.sck == Level::Low && self.pulses >= 24 {
            // Transfer over; the next conversion has been running since the
            // last falling edge.
            self.pulses = 0;
        }
        if self.pulses == 0 {
            return Level::from(!self.is_ready());
        }
        match (self.sck, self.pulses) {
            (Level::High, n @ 1..=24) => Level::from((self.word >> (24 - u32::from(n))) & 1 == 1),
            _ => Level::High,
        }
    }

    fn clock_level(&mut self) -> Level {
        if self.sck == Level::High && !self.powered_down {
            // The host saw its own clock held high: far past the 60 µs limit.
            debug!("simulated hx711 entering power-down");
            self.powered_down = true;
            self.pulses = 0;
        }
        self.sck
    }

    fn drive_clock(&mut self, level: Level) {
        let prev = self.sck;
        self.sck = level;
        match (prev, level) {
            (Level::Low, Level::High) => self.rising_edge(),
            (Level::High, Level::Low) => self.falling_edge(),
            _ => {}
        }
    }

    fn rising_edge(&mut self) {
        if self.powered_down {
            return;
        }
        if self.pulses >= 25 && self.is_ready() {
            // Host skipped the idle data read; previous transfer is over.
            self.pulses = 0;
        }
        if self.pulses == 0 {
            if !self.is_ready() {
                return;
            }
            self.word = self.sample_word();
            trace!(word = self.word, "simulated hx711 transfer start");
        }
        self.pulses = self.pulses.saturating_add(1);
    }

    fn falling_edge(&mut self) {
        if self.powered_down {
            let now = self.clock.now_ms();
            debug!("simulated hx711 reset on power-up");
            self.powered_down = false;
            self.gain_pulses = 1;
            self.pulses = 0;
            self.conversion_started_ms = now;
            self.conversion_len_ms = self.settle_ms;
            return;
        }
        if (25..=27).contains(&self.pulses) {
            self.gain_pulses = self.pulses - 24;
            self.conversion_started_ms = self.clock.now_ms();
            self.conversion_len_ms = self.conversion_ms;
        }
    }
}

impl<C: Clock> Lines for SimulatedHx711<C> {
    fn configure(
        &mut self,
        line: LineId,
        mode: LineMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if line != self.clock_line && line != self.data_line {
            return Err(Box::new(HwError::UnknownLine(line)));
        }
        self.configured.push((line, mode));
        Ok(())
    }

    fn read(&mut self, line: LineId) -> Level {
        if line == self.clock_line {
            self.clock_level()
        } else if line == self.data_line {
            self.data_level()
        } else {
            Level::Low
        }
    }

    fn write(&mut self, line: LineId, level: Level) {
        if line == self.clock_line {
            self.drive_clock(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hx711_traits::ManualClock;

    const CLK: LineId = 6;
    const DAT: LineId = 5;

    fn clock_in(sim: &mut SimulatedHx711<ManualClock>, extra: u8) -> u32 {
        let mut word = 0;
        for _ in 0..24 {
            sim.write(CLK, Level::High);
            word = (word << 1) | u32::from(sim.read(DAT).is_high());
            sim.write(CLK, Level::Low);
        }
        for _ in 0..extra {
            sim.write(CLK, Level::High);
            sim.write(CLK, Level::Low);
        }
        word
    }

    #[test]
    fn busy_until_power_up_settle_elapses() {
        let clock = ManualClock::new();
        let mut sim = SimulatedHx711::new(clock.clone(), CLK, DAT);
        assert_eq!(sim.read(DAT), Level::High);
        clock.advance(POWER_UP_SETTLE_MS - 1);
        assert_eq!(sim.read(DAT), Level::High);
        clock.advance(1);
        assert_eq!(sim.read(DAT), Level::Low);
    }

    #[test]
    fn shifts_out_negative_counts() {
        let clock = ManualClock::starting_at(1_000);
        let mut sim = SimulatedHx711::new(clock.clone(), CLK, DAT).with_counts(-2);
        clock.advance(POWER_UP_SETTLE_MS);
        assert_eq!(clock_in(&mut sim, 1), 0xFF_FFFE);
        // next conversion runs for one period
        assert_eq!(sim.read(DAT), Level::High);
        clock.advance(CONVERSION_MS);
        assert_eq!(sim.read(DAT), Level::Low);
    }

    #[test]
    fn trailing_pulses_select_gain() {
        let clock = ManualClock::new();
        let mut sim = SimulatedHx711::new(clock.clone(), CLK, DAT).with_counts(4_000);
        clock.advance(POWER_UP_SETTLE_MS);
        clock_in(&mut sim, 3);
        assert_eq!(sim.gain_pulses(), 3);
        clock.advance(CONVERSION_MS);
        assert_eq!(sim.read(DAT), Level::Low);
        assert_eq!(clock_in(&mut sim, 2), 2_000);
        clock.advance(CONVERSION_MS);
        assert_eq!(sim.read(DAT), Level::Low);
        assert_eq!(clock_in(&mut sim, 1), 1_000);
    }

    #[test]
    fn observed_high_clock_powers_down_and_low_resets() {
        let clock = ManualClock::new();
        let mut sim = SimulatedHx711::new(clock.clone(), CLK, DAT);
        clock.advance(POWER_UP_SETTLE_MS);
        sim.write(CLK, Level::High);
        assert_eq!(sim.read(CLK), Level::High);
        assert!(sim.is_powered_down());
        assert_eq!(sim.read(DAT), Level::High);
        sim.write(CLK, Level::Low);
        assert!(!sim.is_powered_down());
        assert_eq!(sim.gain_pulses(), 1);
        assert_eq!(sim.read(DAT), Level::High);
        clock.advance(POWER_UP_SETTLE_MS);
        assert_eq!(sim.read(DAT), Level::Low);
    }

    #[test]
    fn disconnected_chip_never_ready() {
        let clock = ManualClock::new();
        let mut sim = SimulatedHx711::new(clock.clone(), CLK, DAT);
        sim.handle().set_connected(false);
        clock.advance(10 * POWER_UP_SETTLE_MS);
        assert_eq!(sim.read(DAT), Level::High);
    }

    #[test]
    fn unknown_line_is_rejected() {
        let mut sim = SimulatedHx711::new(ManualClock::new(), CLK, DAT);
        let err = sim
            .configure(17, LineMode::Output)
            .expect_err("line 17 is not wired");
        assert!(err.downcast_ref::<HwError>().is_some());
        assert!(sim.configure(CLK, LineMode::Output).is_ok());
    }
}
