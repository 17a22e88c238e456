#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for HX711 acquisition.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and performs a robust refit
//!   to reduce outlier influence before deriving tare and adjuster.
use serde::Deserialize;
use serde::de::Deserializer;

/// Calibration CSV schema.
///
/// `raw` is the fixed-point reading (ADC count × 256) as reported by the
/// driver, `value` the known load in the units `adjusted()` should report.
///
/// Expected headers:
/// raw,value
///
/// Example:
/// raw,value
/// 215785728,0
/// 262377728,500
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub raw: i64,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// Clock (PD_SCK) line
    pub clock: u8,
    /// Data (DOUT) line
    pub data: u8,
}

/// Gain/channel as written in TOML: `gain = 128`, `gain = "64"` or
/// `gain = "B32"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GainSetting {
    #[default]
    A128,
    A64,
    B32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GainToml {
    Number(i64),
    Text(String),
}

fn de_gain<'de, D>(deserializer: D) -> Result<GainSetting, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let raw = GainToml::deserialize(deserializer)?;
    let text = match raw {
        GainToml::Number(n) => n.to_string(),
        GainToml::Text(s) => s.trim().to_ascii_uppercase(),
    };
    match text.as_str() {
        "128" | "A128" => Ok(GainSetting::A128),
        "64" | "A64" => Ok(GainSetting::A64),
        "32" | "B32" => Ok(GainSetting::B32),
        other => Err(D::Error::custom(format!(
            "unsupported gain '{other}'; expected 128, 64 or 32"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Acquisition {
    /// Successful transfers after a reset before output is valid
    pub reads_until_valid: u8,
    #[serde(default, deserialize_with = "de_gain")]
    pub gain: GainSetting,
    /// Data line busy longer than this reports a timeout (ms)
    pub busy_timeout_ms: u32,
    /// Caller's poll cadence (ms); the driver itself never sleeps
    pub poll_interval_ms: u64,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            reads_until_valid: 3,
            gain: GainSetting::A128,
            busy_timeout_ms: 500,
            poll_interval_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Exponential smoothing factor; a new sample weighs alpha/256.
    pub alpha: u8,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { alpha: 200 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Tare and adjuster saved by the caller from an earlier calibration.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PersistedCalibration {
    /// Zero baseline in the fixed-point reading domain
    pub tare: i32,
    /// Divisor from tared readings to engineering units
    pub adjuster: i32,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub acquisition: Acquisition,
    #[serde(default)]
    pub filter: FilterCfg,
    /// Optional persisted calibration; preferred at runtime over CSV when present.
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl PersistedCalibration {
    /// Fit calibration rows by ordinary least squares and convert the line
    /// `value = a*raw + b` into `value = (raw - tare) / adjuster`, i.e.
    /// `adjuster = round(1/a)` and `tare = round(-b/a)`.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }

        // Ensure strictly monotonic raw values (increasing or decreasing), no duplicates
        let mut dir: i8 = 0; // 1 for increasing, -1 for decreasing
        for i in 1..rows.len() {
            let d = rows[i].raw - rows[i - 1].raw;
            if d == 0 {
                eyre::bail!(
                    "calibration rows have duplicate raw values at index {} and {}",
                    i - 1,
                    i
                );
            }
            let step_dir = if d > 0 { 1 } else { -1 };
            if dir == 0 {
                dir = step_dir;
            } else if dir != step_dir {
                eyre::bail!(
                    "calibration raw values must be monotonic (strictly increasing or strictly decreasing)"
                );
            }
        }

        let pts: Vec<(f64, f64)> = rows.iter().map(|r| (r.raw as f64, r.value)).collect();
        let (a0, b0) = fit_line(&pts)?;
        let sumsq: f64 = pts
            .iter()
            .map(|(x, y)| {
                let r = y - (a0 * x + b0);
                r * r
            })
            .sum();
        let rms = (sumsq / pts.len() as f64).sqrt();

        // Reject outliers with |residual| > 2σ and refit if at least 2 remain.
        let (a, b) = robust_refit(&pts, a0, b0, rms, 2.0).unwrap_or((a0, b0));

        let adjuster = (1.0 / a).round();
        if !adjuster.is_finite() || adjuster < f64::from(i32::MIN) || adjuster > f64::from(i32::MAX)
        {
            eyre::bail!("calibration adjuster out of range: {adjuster}");
        }
        if adjuster == 0.0 {
            eyre::bail!("calibration adjuster rounds to zero (more than one unit per count)");
        }
        let tare = (-b / a).round();
        if !tare.is_finite() || tare < f64::from(i32::MIN) || tare > f64::from(i32::MAX) {
            eyre::bail!("calibration produced invalid tare baseline");
        }

        Ok(PersistedCalibration {
            tare: tare as i32,
            adjuster: adjuster as i32,
        })
    }
}

/// Ordinary least squares fit `y = a*x + b`, rejecting degenerate lines.
fn fit_line(pts: &[(f64, f64)]) -> eyre::Result<(f64, f64)> {
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for (px, py) in pts {
        let x = px - mean_x;
        sxx += x * x;
        sxy += x * (py - mean_y);
    }
    if !sxx.is_finite() || sxx == 0.0 {
        eyre::bail!("calibration cannot determine slope (degenerate X variance)");
    }
    let a = sxy / sxx;
    if !a.is_finite() {
        eyre::bail!("calibration produced non-finite slope");
    }
    if a == 0.0 {
        eyre::bail!("calibration produced zero slope (value does not change with load)");
    }
    Ok((a, mean_y - a * mean_x))
}

/// Perform a single-step robust refit by rejecting outliers defined by
/// |residual| > k * rms around the initial line y = a0*x + b0, then refit
/// over the inliers. Returns None when refit is not applicable (non-finite
/// or zero rms, < 2 inliers, nothing rejected, degenerate variance), in
/// which case the caller keeps (a0, b0).
fn robust_refit(pts: &[(f64, f64)], a0: f64, b0: f64, rms: f64, k: f64) -> Option<(f64, f64)> {
    if !(rms.is_finite() && rms > 0.0 && k.is_finite() && k > 0.0) {
        return None;
    }
    let thr = k * rms;
    let inliers: Vec<(f64, f64)> = pts
        .iter()
        .copied()
        .filter(|(x, y)| (y - (a0 * x + b0)).abs() <= thr)
        .collect();
    if inliers.len() < 2 || inliers.len() == pts.len() {
        return None;
    }
    fit_line(&inliers).ok()
}

// Ergonomic conversions for building a calibration
impl TryFrom<Vec<CalibrationRow>> for PersistedCalibration {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl TryFrom<&[CalibrationRow]> for PersistedCalibration {
    type Error = eyre::Report;
    fn try_from(rows: &[CalibrationRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows.to_vec())
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<PersistedCalibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw", "value"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,value', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    PersistedCalibration::try_from(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.clock == self.pins.data {
            eyre::bail!(
                "pins.clock and pins.data must be different lines (both are {})",
                self.pins.clock
            );
        }

        // Acquisition
        if self.acquisition.busy_timeout_ms == 0 {
            eyre::bail!("acquisition.busy_timeout_ms must be >= 1");
        }
        if self.acquisition.busy_timeout_ms > 60 * 1000 {
            eyre::bail!("acquisition.busy_timeout_ms is unreasonably large (>60s)");
        }
        if self.acquisition.poll_interval_ms == 0 {
            eyre::bail!("acquisition.poll_interval_ms must be >= 1");
        }
        if self.acquisition.poll_interval_ms >= u64::from(self.acquisition.busy_timeout_ms) {
            eyre::bail!("acquisition.poll_interval_ms must be < acquisition.busy_timeout_ms");
        }

        // Calibration
        if let Some(cal) = &self.calibration
            && cal.adjuster == 0
        {
            eyre::bail!("calibration.adjuster must be non-zero");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
