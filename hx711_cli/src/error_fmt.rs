//! Human-readable error descriptions and structured JSON error formatting.

use crate::acquire::AcquireError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use hx711_core::error::{BuildError, Hx711Error};

    // Typed matches first
    if let Some(ae) = err.downcast_ref::<AcquireError>() {
        return match ae {
            AcquireError::NotResponding { timeout_ms } => format!(
                "What happened: The HX711 produced no conversion within {timeout_ms} ms.\nLikely causes: Wrong clock/data pins, no power/ground, or the data line is floating.\nHow to fix: Check [pins] in the config and the 2.7-5 V supply, or raise acquisition.busy_timeout_ms."
            ),
            AcquireError::PoweredDown => {
                "What happened: The HX711 is powered down (clock line reads high).\nLikely causes: Another process holds the clock line high, or the line is shorted to VCC.\nHow to fix: Free the clock line and rerun; the chip powers up when the clock goes low.".to_string()
            }
            AcquireError::Deadline(ms) => format!(
                "What happened: No result within {ms} ms.\nLikely causes: The output is still settling (reads_until_valid too high for the deadline) or the chip keeps timing out.\nHow to fix: Raise --max-ms or lower acquisition.reads_until_valid."
            ),
            AcquireError::Interrupted => "Interrupted.".to_string(),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPins => {
                "What happened: No clock/data pins were given to the driver.\nLikely causes: Internal wiring of the builder.\nHow to fix: Provide [pins] clock and data in the config.".to_string()
            }
            BuildError::SharedLine(line) => format!(
                "What happened: Clock and data are both set to line {line}.\nLikely causes: Copy-paste in [pins].\nHow to fix: Give the clock and data lines distinct numbers."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<Hx711Error>() {
        return match he {
            Hx711Error::Line(msg) | Hx711Error::LineFault(msg) => format!(
                "What happened: Failed to set up the clock/data lines ({msg}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process may access GPIO."
            ),
            Hx711Error::Config(msg) => format!(
                "What happened: {msg}.\nLikely causes: The configured line does not exist on this backend.\nHow to fix: Fix the [pins] values in the config."
            ),
            Hx711Error::ZeroAdjuster => {
                "What happened: The adjuster is zero.\nLikely causes: Calibrated against a load too close to the tare.\nHow to fix: Re-run `calibrate` with a heavier reference load.".to_string()
            }
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nDetails: {}\nHow to fix: Compare against etc/hx711.toml.",
            te.message()
        );
    }

    // String-based heuristics for errors coming from config validation
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'raw,value'.".to_string();
    }

    if lower.starts_with("pins.")
        || lower.starts_with("acquisition.")
        || lower.starts_with("calibration.")
        || lower.starts_with("logging.")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for acquisition failures; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<AcquireError>() {
        Some(AcquireError::NotResponding { .. }) => 3,
        Some(AcquireError::PoweredDown) => 4,
        Some(AcquireError::Deadline(_)) => 5,
        Some(AcquireError::Interrupted) => 130,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<AcquireError>() {
        Some(AcquireError::NotResponding { .. }) => "NotResponding",
        Some(AcquireError::PoweredDown) => "PoweredDown",
        Some(AcquireError::Deadline(_)) => "Deadline",
        Some(AcquireError::Interrupted) => "Interrupted",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let details = match err.downcast_ref::<AcquireError>() {
        Some(AcquireError::NotResponding { timeout_ms }) => {
            Some(json!({ "busy_timeout_ms": timeout_ms }))
        }
        Some(AcquireError::Deadline(ms)) => Some(json!({ "max_ms": ms })),
        _ => None,
    };

    let obj = match details {
        Some(d) => json!({ "reason": reason_name(err), "details": d, "message": humanize(err) }),
        None => json!({ "reason": reason_name(err), "message": humanize(err) }),
    };
    obj.to_string()
}
