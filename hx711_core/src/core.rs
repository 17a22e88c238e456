//! The polled acquisition state machine.

use hx711_traits::{Clock, Level, LineId, LineMode, Lines};
use tracing::{debug, warn};

use crate::builder::{Hx711Builder, Missing};
use crate::calibration::Calibration;
use crate::config::AcquisitionCfg;
use crate::error::{Hx711Error, Result};
use crate::filter::Smoother;
use crate::fixed_point::fixed_to_counts;
use crate::gain::Gain;
use crate::hw_error::map_line_error;
use crate::protocol::{self, Pins};
use crate::settling::{Settle, SettlingGate};
use crate::status::Status;
use crate::types::Source;

/// One HX711 on an exclusively owned clock/data line pair.
///
/// Call [`Hx711::poll`] repeatedly from the control loop. Each call does a
/// bounded amount of work and never waits: it returns `false` while the chip
/// is converting or settling and `true` once the cycle concluded, with
/// [`Hx711::status`] telling how.
pub struct Hx711<L, C> {
    lines: L,
    clock: C,
    pins: Pins,
    gain: Gain,
    status: Status,
    raw: i32,
    smoother: Smoother,
    gate: SettlingGate,
    calibration: Calibration,
    busy_timeout_ms: u32,
    // Start of the conversion the next transfer will read
    conversion_start_ms: u32,
    // Start of the conversion behind `raw`
    timestamp_ms: u32,
}

impl<L, C> std::fmt::Debug for Hx711<L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hx711")
            .field("pins", &self.pins)
            .field("gain", &self.gain)
            .field("status", &self.status)
            .field("raw", &self.raw)
            .field("smoothed", &self.smoother.value())
            .field("settling", &self.gate)
            .field("calibration", &self.calibration)
            .field("timestamp_ms", &self.timestamp_ms)
            .finish()
    }
}

impl Hx711<Missing, Missing> {
    /// Start building an `Hx711`.
    pub fn builder() -> Hx711Builder<Missing, Missing> {
        Hx711Builder::default()
    }
}

impl<L: Lines, C: Clock> Hx711<L, C> {
    /// Take ownership of the lines with default settings: three reads until
    /// valid, gain 128 on channel A, alpha 200, adjuster 256.
    pub fn new(lines: L, clock: C, clock_line: LineId, data_line: LineId) -> Result<Self> {
        Hx711Builder::default()
            .with_lines(lines)
            .with_clock(clock)
            .with_pins(clock_line, data_line)
            .build()
    }

    /// Configure both lines and drive the clock low (which also powers the
    /// chip up). Settings are assumed validated.
    pub(crate) fn from_parts(
        mut lines: L,
        clock: C,
        pins: Pins,
        cfg: AcquisitionCfg,
        calibration: Calibration,
    ) -> Result<Self> {
        lines
            .configure(pins.data, LineMode::InputPullUp)
            .map_err(|e| map_line_error(e.as_ref()))
            .map_err(|e| {
                eyre::Report::new(e).wrap_err(format!("configure data line {}", pins.data))
            })?;
        lines
            .configure(pins.clock, LineMode::Output)
            .map_err(|e| map_line_error(e.as_ref()))
            .map_err(|e| {
                eyre::Report::new(e).wrap_err(format!("configure clock line {}", pins.clock))
            })?;
        lines.write(pins.clock, Level::Low);
        let now = clock.now_ms();
        debug!(
            clock_line = pins.clock,
            data_line = pins.data,
            gain = cfg.gain.factor(),
            reads_until_valid = cfg.reads_until_valid,
            "hx711 attached"
        );
        Ok(Self {
            lines,
            clock,
            pins,
            gain: cfg.gain,
            status: Status::Init,
            raw: 0,
            smoother: Smoother::new(cfg.alpha),
            gate: SettlingGate::new(cfg.reads_until_valid),
            calibration,
            busy_timeout_ms: cfg.busy_timeout_ms,
            conversion_start_ms: now,
            timestamp_ms: 0,
        })
    }

    /// Advance the acquisition by at most one transfer.
    ///
    /// Returns `true` when the conversion cycle concluded with `Valid`,
    /// `TimedOut` or `PoweredDown`; `false` while the chip is busy or the
    /// output is still settling after a reset.
    pub fn poll(&mut self) -> bool {
        if self.lines.read(self.pins.clock).is_high() {
            if self.status != Status::PoweredDown {
                debug!("hx711 clock line high, chip powered down");
            }
            self.status = Status::PoweredDown;
            return true;
        }

        if self.lines.read(self.pins.data).is_high() {
            let busy_ms = self.clock.ms_since(self.conversion_start_ms);
            if busy_ms < self.busy_timeout_ms {
                return false;
            }
            if self.status != Status::TimedOut {
                warn!(
                    busy_ms,
                    timeout_ms = self.busy_timeout_ms,
                    "hx711 conversion timed out"
                );
            }
            self.status = Status::TimedOut;
            return true;
        }

        if self.status == Status::TimedOut {
            debug!("hx711 responding again after timeout, resettling");
            self.status = Status::Init;
            self.gate.reset();
        }

        self.timestamp_ms = self.conversion_start_ms;
        self.raw = protocol::transfer(&mut self.lines, self.pins, self.gain);
        self.conversion_start_ms = self.clock.now_ms();

        match self.gate.advance() {
            Settle::Settling => return false,
            Settle::JustSettled => {
                self.smoother.seed(self.raw);
                debug!(raw = self.raw, "hx711 output settled");
            }
            Settle::Steady => {
                self.smoother.update(self.raw);
            }
        }
        self.status = Status::Valid;
        true
    }

    /// Status of the last concluded poll.
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Select gain and channel. Takes effect after the next transfer, so the
    /// output must settle again.
    pub fn set_gain(&mut self, gain: Gain) {
        debug!(
            from = self.gain.factor(),
            to = gain.factor(),
            channel = ?gain.channel(),
            "hx711 gain change"
        );
        self.gain = gain;
        self.status = Status::Init;
        self.gate.reset();
    }

    /// Currently selected gain.
    #[inline]
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Smoothing weight of the newest sample, in 1/256 units.
    #[inline]
    pub fn set_alpha(&mut self, alpha: u8) {
        self.smoother.set_alpha(alpha);
    }

    /// Current smoothing weight.
    #[inline]
    pub fn alpha(&self) -> u8 {
        self.smoother.alpha()
    }

    /// Milliseconds timestamp of the start of the conversion behind the
    /// current reading.
    #[inline]
    pub fn timestamp(&self) -> u32 {
        self.timestamp_ms
    }

    /// Fixed-point reading (ADC count × 256).
    #[inline]
    pub fn raw(&self, source: Source) -> i32 {
        match source {
            Source::Raw => self.raw,
            Source::Smoothed => self.smoother.value(),
        }
    }

    /// Reading as a plain ADC count.
    #[inline]
    pub fn counts(&self, source: Source) -> i32 {
        fixed_to_counts(self.raw(source))
    }

    /// Use the current reading as the zero baseline.
    pub fn tare(&mut self, source: Source) {
        self.calibration.tare = self.raw(source);
        debug!(tare = self.calibration.tare, ?source, "hx711 tared");
    }

    /// Restore a previously measured tare (fixed-point).
    #[inline]
    pub fn set_tare(&mut self, tare: i32) {
        self.calibration.tare = tare;
    }

    /// Zero baseline, fixed-point.
    #[inline]
    pub fn tare_offset(&self) -> i32 {
        self.calibration.tare
    }

    /// Reading with the tare removed; saturates instead of overflowing.
    #[inline]
    pub fn raw_minus_tare(&self, source: Source) -> i32 {
        self.calibration.minus_tare(self.raw(source))
    }

    /// Derive the adjuster so that [`Hx711::adjusted`] reports `value` for
    /// the current reading. A `value` of 0 is treated as 1.
    pub fn adjust_to(&mut self, value: i32, source: Source) {
        let reading = self.raw(source);
        self.calibration.adjust_to(reading, value);
        debug!(value, adjuster = self.calibration.adjuster, ?source, "hx711 adjusted");
    }

    /// Fixed-point units per unit of the adjusted value.
    #[inline]
    pub fn adjuster(&self) -> i32 {
        self.calibration.adjuster
    }

    /// Restore a previously fitted adjuster. Zero makes `adjusted` fail.
    #[inline]
    pub fn set_adjuster(&mut self, adjuster: i32) {
        self.calibration.adjuster = adjuster;
    }

    /// `(reading - tare) / adjuster`; errors if the adjuster is zero.
    pub fn adjusted(&self, source: Source) -> std::result::Result<i32, Hx711Error> {
        self.calibration.adjusted(self.raw(source))
    }

    /// Tare and adjuster as one value, e.g. for persisting.
    #[inline]
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Drive the clock high; the chip enters power-down and the next poll
    /// reports `PoweredDown`.
    pub fn power_down(&mut self) {
        debug!("hx711 power down");
        self.lines.write(self.pins.clock, Level::High);
    }

    /// Drive the clock low. The chip resets, so the output must settle again
    /// and the busy timeout restarts from now.
    pub fn power_up(&mut self) {
        debug!("hx711 power up");
        self.lines.write(self.pins.clock, Level::Low);
        self.status = Status::Init;
        self.gate.reset();
        self.conversion_start_ms = self.clock.now_ms();
    }

    /// Transfers required after a reset before output is valid. Lowering it
    /// below the current count clamps the count.
    pub fn set_reads_until_valid(&mut self, reads_until_valid: u8) {
        self.gate.set_threshold(reads_until_valid);
    }

    /// Settling threshold.
    #[inline]
    pub fn reads_until_valid(&self) -> u8 {
        self.gate.threshold()
    }

    /// Successful transfers counted since the last reset, capped at
    /// `reads_until_valid`.
    #[inline]
    pub fn settling_count(&self) -> u8 {
        self.gate.count()
    }

    /// How long the data line may stay high before `TimedOut`.
    #[inline]
    pub fn busy_timeout_ms(&self) -> u32 {
        self.busy_timeout_ms
    }

    /// Clock and data line ids.
    #[inline]
    pub fn pins(&self) -> Pins {
        self.pins
    }

    /// Give the lines and clock back to the caller.
    pub fn into_parts(self) -> (L, C) {
        (self.lines, self.clock)
    }
}
