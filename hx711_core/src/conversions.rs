//! `From` implementations bridging `hx711_config` types to `hx711_core` types.

use crate::calibration::Calibration;
use crate::config::AcquisitionCfg;
use crate::gain::Gain;

// ── Gain ─────────────────────────────────────────────────────────────────────

impl From<hx711_config::GainSetting> for Gain {
    fn from(g: hx711_config::GainSetting) -> Self {
        match g {
            hx711_config::GainSetting::A128 => Gain::Gain128,
            hx711_config::GainSetting::A64 => Gain::Gain64,
            hx711_config::GainSetting::B32 => Gain::Gain32,
        }
    }
}

// ── AcquisitionCfg ───────────────────────────────────────────────────────────

impl From<&hx711_config::Config> for AcquisitionCfg {
    fn from(c: &hx711_config::Config) -> Self {
        Self {
            reads_until_valid: c.acquisition.reads_until_valid,
            gain: c.acquisition.gain.into(),
            alpha: c.filter.alpha,
            busy_timeout_ms: c.acquisition.busy_timeout_ms,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&hx711_config::PersistedCalibration> for Calibration {
    fn from(c: &hx711_config::PersistedCalibration) -> Self {
        Self {
            tare: c.tare,
            adjuster: c.adjuster,
        }
    }
}

impl From<hx711_config::PersistedCalibration> for Calibration {
    fn from(c: hx711_config::PersistedCalibration) -> Self {
        Self::from(&c)
    }
}
