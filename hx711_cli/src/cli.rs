//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "hx711", version, about = "Polled HX711 load-cell reader")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/hx711.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV (strict `raw,value` header); overrides
    /// `[calibration]` from the config
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print readings and errors as JSON lines; logs become JSON too
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace). RUST_LOG wins if set.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

/// Which reading a command works on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SourceArg {
    #[default]
    Raw,
    Smoothed,
}

impl From<SourceArg> for hx711_core::Source {
    fn from(s: SourceArg) -> Self {
        match s {
            SourceArg::Raw => hx711_core::Source::Raw,
            SourceArg::Smoothed => hx711_core::Source::Smoothed,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the chip and print valid readings
    Read {
        /// Stop after this many valid readings
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Reading used for the net/value columns
        #[arg(long, value_enum, default_value_t = SourceArg::Raw)]
        source: SourceArg,
        /// Give up after this many milliseconds
        #[arg(long, value_name = "MS")]
        max_ms: Option<u64>,
        /// Power the chip down after the last reading
        #[arg(long, action = ArgAction::SetTrue)]
        power_down: bool,
        /// Enable real-time mode (SCHED_FIFO, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nA bit-banged transfer must not hold the clock high for more than 60 µs or the chip powers down mid-read. Linux: attempts SCHED_FIFO priority and mlockall to keep the poll loop from being preempted or paged out. May require elevated privileges or ulimits (e.g., memlock).\n\nmacOS: only mlockall is applied."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max); ignored on macOS
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE", default_value_t = RtLock::Current)]
        rt_lock: RtLock,
    },
    /// Wait for a valid reading and use it as the zero baseline
    Tare {
        #[arg(long, value_enum, default_value_t = SourceArg::Smoothed)]
        source: SourceArg,
        /// Give up after this many milliseconds
        #[arg(long, value_name = "MS", default_value_t = 5_000)]
        max_ms: u64,
    },
    /// Derive the adjuster from a known load on the cell
    Calibrate {
        /// Value the current load should read as (e.g. grams)
        #[arg(long)]
        value: i32,
        #[arg(long, value_enum, default_value_t = SourceArg::Smoothed)]
        source: SourceArg,
        /// Give up after this many milliseconds
        #[arg(long, value_name = "MS", default_value_t = 5_000)]
        max_ms: u64,
    },
    /// Poll once to a conclusion and report the chip status
    SelfCheck {
        /// Give up after this many milliseconds
        #[arg(long, value_name = "MS", default_value_t = 5_000)]
        max_ms: u64,
    },
}
