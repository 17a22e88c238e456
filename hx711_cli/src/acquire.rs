//! Poll loops behind the subcommands.
//!
//! The driver never blocks; pacing happens here by sleeping one poll
//! interval between calls to `poll()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use hx711_core::{Hx711, Source, Status};
use hx711_traits::{Clock, Lines};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("hx711 not responding: no conversion within {timeout_ms} ms")]
    NotResponding { timeout_ms: u32 },
    #[error("hx711 is powered down (clock line observed high)")]
    PoweredDown,
    #[error("no result within {0} ms")]
    Deadline(u64),
    #[error("interrupted")]
    Interrupted,
}

/// Pacing and cancellation shared by every loop.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    pub poll_interval: Duration,
    pub shutdown: Arc<AtomicBool>,
    pub json: bool,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    ms: u64,
}

impl Deadline {
    fn after(ms: u64) -> Self {
        Self {
            at: Instant::now() + Duration::from_millis(ms),
            ms,
        }
    }
}

/// Snapshot of the driver's latest reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub timestamp_ms: u32,
    pub raw: i32,
    pub smoothed: i32,
    pub counts: i32,
    pub net: i32,
    /// `None` while the adjuster is zero
    pub value: Option<i32>,
}

impl Reading {
    pub fn capture<L: Lines, C: Clock>(hx: &Hx711<L, C>, source: Source) -> Self {
        Self {
            timestamp_ms: hx.timestamp(),
            raw: hx.raw(Source::Raw),
            smoothed: hx.raw(Source::Smoothed),
            counts: hx.counts(source),
            net: hx.raw_minus_tare(source),
            value: hx.adjusted(source).ok(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "timestamp_ms": self.timestamp_ms,
            "raw": self.raw,
            "smoothed": self.smoothed,
            "counts": self.counts,
            "net": self.net,
            "value": self.value,
        })
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={}ms raw={} smoothed={} counts={} net={}",
            self.timestamp_ms, self.raw, self.smoothed, self.counts, self.net
        )?;
        match self.value {
            Some(v) => write!(f, " value={v}"),
            None => write!(f, " value=n/a"),
        }
    }
}

fn emit(lc: &LoopCfg, value: serde_json::Value, text: impl std::fmt::Display) {
    if lc.json {
        println!("{value}");
    } else {
        println!("{text}");
    }
}

/// Poll until a cycle concludes and return how it ended.
fn next_conclusion<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    deadline: Option<Deadline>,
) -> Result<Status, AcquireError> {
    loop {
        if lc.shutdown.load(Ordering::Relaxed) {
            return Err(AcquireError::Interrupted);
        }
        // a disconnected chip concludes every poll with TimedOut
        if let Some(d) = deadline
            && Instant::now() >= d.at
        {
            return Err(AcquireError::Deadline(d.ms));
        }
        if hx.poll() {
            return Ok(hx.status());
        }
        std::thread::sleep(lc.poll_interval);
    }
}

/// Poll until the output is valid. Timeouts and power-down fail fast.
pub fn wait_for_valid<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    max_ms: u64,
) -> Result<(), AcquireError> {
    let deadline = Some(Deadline::after(max_ms));
    match next_conclusion(hx, lc, deadline)? {
        Status::Valid => Ok(()),
        Status::PoweredDown => Err(AcquireError::PoweredDown),
        Status::TimedOut | Status::Init => Err(AcquireError::NotResponding {
            timeout_ms: hx.busy_timeout_ms(),
        }),
    }
}

/// Print `count` valid readings. A timed-out chip is reported and polled
/// again, since the driver recovers on its own once data arrives.
pub fn run_read<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    count: u32,
    source: Source,
    max_ms: Option<u64>,
) -> Result<u32, AcquireError> {
    let deadline = max_ms.map(Deadline::after);
    let mut printed = 0;
    let mut was_timed_out = false;
    while printed < count {
        match next_conclusion(hx, lc, deadline)? {
            Status::Valid => {
                if was_timed_out {
                    tracing::info!("hx711 recovered");
                    was_timed_out = false;
                }
                let r = Reading::capture(hx, source);
                emit(lc, r.to_json(), r);
                printed += 1;
            }
            Status::TimedOut => {
                if !was_timed_out {
                    tracing::warn!(
                        timeout_ms = hx.busy_timeout_ms(),
                        "no conversion from hx711; waiting for it to recover"
                    );
                }
                was_timed_out = true;
                std::thread::sleep(lc.poll_interval);
            }
            Status::PoweredDown => return Err(AcquireError::PoweredDown),
            Status::Init => {}
        }
    }
    Ok(printed)
}

pub fn run_tare<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    source: Source,
    max_ms: u64,
) -> Result<i32, AcquireError> {
    wait_for_valid(hx, lc, max_ms)?;
    hx.tare(source);
    let tare = hx.tare_offset();
    emit(
        lc,
        json!({ "tare": tare, "adjuster": hx.adjuster() }),
        format_calibration(tare, hx.adjuster()),
    );
    Ok(tare)
}

/// Fit the adjuster so the current load reads as `value`. The tare comes
/// from the restored calibration; run `tare` first on a fresh setup.
pub fn run_calibrate<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    value: i32,
    source: Source,
    max_ms: u64,
) -> Result<i32, AcquireError> {
    wait_for_valid(hx, lc, max_ms)?;
    hx.adjust_to(value, source);
    let adjuster = hx.adjuster();
    if adjuster == 0 {
        tracing::warn!(
            net = hx.raw_minus_tare(source),
            value,
            "load too close to tare for this value; adjuster is zero"
        );
    }
    emit(
        lc,
        json!({ "tare": hx.tare_offset(), "adjuster": adjuster }),
        format_calibration(hx.tare_offset(), adjuster),
    );
    Ok(adjuster)
}

/// Report how the first poll cycle concludes. `TimedOut` and
/// `PoweredDown` are errors so the exit code reflects them.
pub fn run_self_check<L: Lines, C: Clock>(
    hx: &mut Hx711<L, C>,
    lc: &LoopCfg,
    max_ms: u64,
) -> Result<Status, AcquireError> {
    let status = next_conclusion(hx, lc, Some(Deadline::after(max_ms)))?;
    emit(
        lc,
        json!({ "status": status.as_str(), "counts": hx.counts(Source::Raw) }),
        format!("status: {status}"),
    );
    match status {
        Status::TimedOut => Err(AcquireError::NotResponding {
            timeout_ms: hx.busy_timeout_ms(),
        }),
        Status::PoweredDown => Err(AcquireError::PoweredDown),
        s => Ok(s),
    }
}

/// TOML snippet the caller can paste into the config to persist.
fn format_calibration(tare: i32, adjuster: i32) -> String {
    format!("[calibration]\ntare = {tare}\nadjuster = {adjuster}")
}
