#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = hx711_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // a valid config must always convert into driver settings
            let acq: hx711_core::AcquisitionCfg = (&cfg).into();
            assert!(acq.busy_timeout_ms >= 1);
            if let Some(cal) = cfg.calibration {
                assert_ne!(hx711_core::Calibration::from(cal).adjuster, 0);
            }
        }
    }
});
