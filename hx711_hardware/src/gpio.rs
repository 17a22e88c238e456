use std::collections::HashMap;

use hx711_traits::{Level, LineId, LineMode, Lines};
use rppal::gpio::{Gpio, IoPin, Mode, PullUpDown};
use tracing::{debug, warn};

use crate::error::{HwError, Result};

/// BCM GPIO lines of a Raspberry Pi.
///
/// Each configured line is held as an `IoPin` so its mode can be set once
/// and then read or driven without further allocation.
pub struct RppalLines {
    gpio: Gpio,
    pins: HashMap<LineId, IoPin>,
}

impl RppalLines {
    pub fn new() -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }
}

impl Lines for RppalLines {
    fn configure(
        &mut self,
        line: LineId,
        mode: LineMode,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pin = self
            .gpio
            .get(line)
            .map_err(|e| HwError::Gpio(format!("open line {line}: {e}")))?;
        let io = match mode {
            LineMode::Output => pin.into_io(Mode::Output),
            LineMode::Input => pin.into_io(Mode::Input),
            LineMode::InputPullUp => {
                let mut io = pin.into_io(Mode::Input);
                io.set_pullupdown(PullUpDown::PullUp);
                io
            }
        };
        debug!(line, ?mode, "gpio line configured");
        self.pins.insert(line, io);
        Ok(())
    }

    #[inline]
    fn read(&mut self, line: LineId) -> Level {
        match self.pins.get(&line) {
            Some(pin) => Level::from(pin.is_high()),
            None => {
                warn!(line, "read from unconfigured gpio line");
                Level::Low
            }
        }
    }

    #[inline]
    fn write(&mut self, line: LineId, level: Level) {
        if let Some(pin) = self.pins.get_mut(&line) {
            match level {
                Level::High => pin.set_high(),
                Level::Low => pin.set_low(),
            }
        }
    }
}
