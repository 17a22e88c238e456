//! Bit-level 2-wire transfer.
//!
//! The clock must not stay high for more than 60 µs during a transfer or the
//! chip enters power-down; every pulse here is a write-high/write-low pair
//! with only a spin hint in between.

use hx711_traits::{Level, LineId, Lines};
use tracing::trace;

use crate::fixed_point::{SAMPLE_BITS, sample_to_fixed};
use crate::gain::Gain;

/// Clock and data line of one chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pins {
    pub clock: LineId,
    pub data: LineId,
}

/// Shift out one conversion MSB first and return the fixed-point reading.
///
/// Afterwards issues the trailing pulses that select `next_gain` for the
/// following conversion.
pub fn transfer<L: Lines + ?Sized>(lines: &mut L, pins: Pins, next_gain: Gain) -> i32 {
    let word = shift_in(lines, pins);
    pulse(lines, pins.clock, next_gain.extra_pulses());
    let raw = sample_to_fixed(word);
    trace!(word, raw, "hx711 sample");
    raw
}

/// Clock in 24 bits, MSB first. The data line is sampled while the clock is
/// high.
pub fn shift_in<L: Lines + ?Sized>(lines: &mut L, pins: Pins) -> u32 {
    let mut word: u32 = 0;
    for _ in 0..SAMPLE_BITS {
        lines.write(pins.clock, Level::High);
        spin_delay();
        word = (word << 1) | u32::from(lines.read(pins.data).is_high());
        lines.write(pins.clock, Level::Low);
        spin_delay();
    }
    word
}

/// Issue `n` bare clock pulses.
pub fn pulse<L: Lines + ?Sized>(lines: &mut L, clock: LineId, n: u8) {
    for _ in 0..n {
        lines.write(clock, Level::High);
        spin_delay();
        lines.write(clock, Level::Low);
        spin_delay();
    }
}

#[inline(always)]
fn spin_delay() {
    // The chip needs >= 0.2 µs per clock phase; a pair of line writes on any
    // supported backend already takes longer.
    std::hint::spin_loop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedLines;

    const PINS: Pins = Pins { clock: 6, data: 5 };

    #[test]
    fn shifts_msb_first() {
        let mut lines = ScriptedLines::new(PINS.clock, PINS.data);
        lines.set_sample_word(0b1010_0000_0000_0000_0000_0001);
        assert_eq!(shift_in(&mut lines, PINS), 0xA0_0001);
        assert_eq!(lines.pulses_since_ready(), 24);
        assert_eq!(lines.clock_level(), Level::Low);
    }

    #[test]
    fn transfer_appends_gain_pulses() {
        for (gain, total) in [(Gain::Gain128, 25), (Gain::Gain32, 26), (Gain::Gain64, 27)] {
            let mut lines = ScriptedLines::new(PINS.clock, PINS.data);
            lines.set_sample(-1);
            assert_eq!(transfer(&mut lines, PINS, gain), -256);
            assert_eq!(lines.pulses_since_ready(), total);
        }
    }
}
