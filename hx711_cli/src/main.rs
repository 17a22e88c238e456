mod acquire;
mod cli;
mod error_fmt;
mod rt;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use hx711_config::{Config, Logging};
use hx711_core::{AcquisitionCfg, Hx711};
use hx711_traits::{Clock, Lines, MonotonicClock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::acquire::LoopCfg;
use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

/// Simulated bridge output when `HX711_SIM_COUNTS` is unset.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const DEFAULT_SIM_COUNTS: i32 = 100_000;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
            tracing::debug!(error = ?err, "full error report");
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.json {
        color_eyre::install()?;
    }

    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging)?;

    // CSV beats [calibration] in the config
    let calibration = match &cli.calibration {
        Some(path) => Some(hx711_config::load_calibration_csv(path)?),
        None => cfg.calibration,
    };
    if let Some(c) = &calibration {
        tracing::info!(tare = c.tare, adjuster = c.adjuster, "calibration restored");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }
    let lc = LoopCfg {
        poll_interval: Duration::from_millis(cfg.acquisition.poll_interval_ms),
        shutdown,
        json: cli.json,
    };

    let clock = MonotonicClock::new();
    let lines = open_lines(clock, &cfg)?;
    let acquisition: AcquisitionCfg = (&cfg).into();
    let mut hx = Hx711::builder()
        .with_lines(lines)
        .with_clock(clock)
        .with_pins(cfg.pins.clock, cfg.pins.data)
        .with_config(acquisition)
        .apply_calibration(calibration.as_ref())
        .build()?;

    dispatch(&mut hx, &cli.cmd, &lc)
}

fn dispatch<L: Lines, C: Clock>(hx: &mut Hx711<L, C>, cmd: &Commands, lc: &LoopCfg) -> Result<()> {
    match *cmd {
        Commands::Read {
            count,
            source,
            max_ms,
            power_down,
            rt,
            rt_prio,
            rt_lock,
        } => {
            if rt {
                rt::setup_rt_once(rt_prio, rt_lock);
            }
            let res = acquire::run_read(hx, lc, count, source.into(), max_ms);
            if power_down {
                hx.power_down();
            }
            let n = res?;
            tracing::info!(readings = n, "read complete");
        }
        Commands::Tare { source, max_ms } => {
            acquire::run_tare(hx, lc, source.into(), max_ms)?;
        }
        Commands::Calibrate {
            value,
            source,
            max_ms,
        } => {
            acquire::run_calibrate(hx, lc, value, source.into(), max_ms)?;
        }
        Commands::SelfCheck { max_ms } => {
            acquire::run_self_check(hx, lc, max_ms)?;
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = hx711_config::load_toml(&text)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console logs go to stderr (stdout carries readings); an optional JSON
/// file sink comes from `[logging]`. Level precedence: RUST_LOG, then
/// --log-level, then `logging.level`.
fn init_tracing(cli: &Cli, logging: &Logging) -> Result<()> {
    let level = cli
        .log_level
        .as_deref()
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_lines(_clock: MonotonicClock, cfg: &Config) -> Result<hx711_hardware::RppalLines> {
    tracing::info!(
        clock = cfg.pins.clock,
        data = cfg.pins.data,
        "using GPIO lines"
    );
    hx711_hardware::RppalLines::new().wrap_err("open GPIO")
}

/// Simulated chip; `HX711_SIM_COUNTS` sets the bridge output and
/// `HX711_SIM_DISCONNECTED=1` leaves the data line floating high.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_lines(
    clock: MonotonicClock,
    cfg: &Config,
) -> Result<hx711_hardware::SimulatedHx711<MonotonicClock>> {
    let counts = match std::env::var("HX711_SIM_COUNTS") {
        Ok(v) => v
            .trim()
            .parse::<i32>()
            .wrap_err_with(|| format!("HX711_SIM_COUNTS={v:?} is not an integer"))?,
        Err(_) => DEFAULT_SIM_COUNTS,
    };
    let sim =
        hx711_hardware::SimulatedHx711::new(clock, cfg.pins.clock, cfg.pins.data).with_counts(counts);
    if std::env::var("HX711_SIM_DISCONNECTED").is_ok_and(|v| v == "1") {
        sim.handle().set_connected(false);
    }
    tracing::info!(counts, "using simulated hx711");
    Ok(sim)
}
