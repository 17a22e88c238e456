//! Test and helper mocks for hx711_core

use std::cell::RefCell;
use std::rc::Rc;

use hx711_traits::{Level, LineId, LineMode, Lines};

#[derive(Debug)]
struct Script {
    clock: Level,
    clock_held_high: bool,
    busy: bool,
    word: u32,
    pulses: u32,
    configured: Vec<(LineId, LineMode)>,
    fail_configure: bool,
}

/// Scripted line pair standing in for a chip.
///
/// - The clock line reads back whatever was last written to it, unless
///   `hold_clock_high` forces it high from the outside.
/// - The data line reads high while `set_busy(true)`; otherwise it reads low
///   while the clock is low (conversion ready) and presents the scripted
///   sample MSB first while the clock is high.
///
/// A data read with the clock low marks the start of a new transfer, so
/// `pulses_since_ready` reports how many clock pulses the last transfer
/// issued. Clones share one script, so a test can keep a clone after moving
/// the lines into the driver.
#[derive(Debug, Clone)]
pub struct ScriptedLines {
    clock_line: LineId,
    data_line: LineId,
    script: Rc<RefCell<Script>>,
}

impl ScriptedLines {
    pub fn new(clock_line: LineId, data_line: LineId) -> Self {
        Self {
            clock_line,
            data_line,
            script: Rc::new(RefCell::new(Script {
                clock: Level::Low,
                clock_held_high: false,
                busy: false,
                word: 0,
                pulses: 0,
                configured: Vec::new(),
                fail_configure: false,
            })),
        }
    }

    /// Make every `configure` call fail, as a missing GPIO would.
    pub fn failing_configure(self) -> Self {
        self.script.borrow_mut().fail_configure = true;
        self
    }

    /// Next sample as a signed ADC count (only the low 24 bits are sent).
    pub fn set_sample(&self, counts: i32) {
        self.set_sample_word(counts as u32);
    }

    /// Next sample as the raw 24-bit word.
    pub fn set_sample_word(&self, word: u32) {
        self.script.borrow_mut().word = word & 0x00FF_FFFF;
    }

    pub fn set_busy(&self, busy: bool) {
        self.script.borrow_mut().busy = busy;
    }

    /// Force the clock line to read high regardless of what the host drives.
    pub fn hold_clock_high(&self, held: bool) {
        self.script.borrow_mut().clock_held_high = held;
    }

    pub fn clock_level(&self) -> Level {
        self.script.borrow().clock
    }

    pub fn pulses_since_ready(&self) -> u32 {
        self.script.borrow().pulses
    }

    pub fn configured(&self) -> Vec<(LineId, LineMode)> {
        self.script.borrow().configured.clone()
    }
}

impl Lines for ScriptedLines {
    fn configure(
        &mut self,
        line: LineId,
        mode: LineMode,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.script.borrow_mut();
        if s.fail_configure {
            return Err(Box::new(std::io::Error::other(format!(
                "line {line} unavailable"
            ))));
        }
        s.configured.push((line, mode));
        Ok(())
    }

    fn read(&mut self, line: LineId) -> Level {
        let mut s = self.script.borrow_mut();
        if line == self.clock_line {
            return if s.clock_held_high {
                Level::High
            } else {
                s.clock
            };
        }
        if line != self.data_line || s.busy {
            return Level::High;
        }
        if s.clock == Level::Low {
            s.pulses = 0;
            return Level::Low;
        }
        match s.pulses {
            n @ 1..=24 => Level::from((s.word >> (24 - n)) & 1 == 1),
            _ => Level::High,
        }
    }

    fn write(&mut self, line: LineId, level: Level) {
        if line != self.clock_line {
            return;
        }
        let mut s = self.script.borrow_mut();
        if s.clock == Level::Low && level == Level::High {
            s.pulses += 1;
        }
        s.clock = level;
    }
}
