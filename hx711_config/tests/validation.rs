use hx711_config::{GainSetting, load_toml};
use rstest::rstest;

const MINIMAL: &str = r#"
[pins]
clock = 6
data = 5
"#;

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.acquisition.reads_until_valid, 3);
    assert_eq!(cfg.acquisition.gain, GainSetting::A128);
    assert_eq!(cfg.acquisition.busy_timeout_ms, 500);
    assert_eq!(cfg.filter.alpha, 200);
    assert!(cfg.calibration.is_none());
}

#[rstest]
#[case("128", GainSetting::A128)]
#[case("64", GainSetting::A64)]
#[case("32", GainSetting::B32)]
#[case("\"a64\"", GainSetting::A64)]
#[case("\"B32\"", GainSetting::B32)]
fn gain_accepts_numbers_and_names(#[case] toml_value: &str, #[case] expected: GainSetting) {
    let toml = format!("{MINIMAL}\n[acquisition]\ngain = {toml_value}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    assert_eq!(cfg.acquisition.gain, expected);
}

#[test]
fn rejects_unknown_gain() {
    let toml = format!("{MINIMAL}\n[acquisition]\ngain = 16\n");
    let err = load_toml(&toml).expect_err("gain 16 does not exist");
    assert!(format!("{err}").contains("unsupported gain"));
}

#[test]
fn alpha_out_of_byte_range_is_a_parse_error() {
    let toml = format!("{MINIMAL}\n[filter]\nalpha = 256\n");
    assert!(load_toml(&toml).is_err());
}

#[rstest]
#[case(
    "[pins]\nclock = 5\ndata = 5\n",
    "must be different lines"
)]
#[case(
    "[pins]\nclock = 6\ndata = 5\n[acquisition]\nbusy_timeout_ms = 0\n",
    "busy_timeout_ms must be >= 1"
)]
#[case(
    "[pins]\nclock = 6\ndata = 5\n[acquisition]\npoll_interval_ms = 0\n",
    "poll_interval_ms must be >= 1"
)]
#[case(
    "[pins]\nclock = 6\ndata = 5\n[acquisition]\nbusy_timeout_ms = 100\npoll_interval_ms = 100\n",
    "poll_interval_ms must be <"
)]
#[case(
    "[pins]\nclock = 6\ndata = 5\n[calibration]\ntare = 0\nadjuster = 0\n",
    "adjuster must be non-zero"
)]
#[case(
    "[pins]\nclock = 6\ndata = 5\n[logging]\nrotation = \"weekly\"\n",
    "logging.rotation"
)]
fn validation_rejects(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn full_config_round_trip() {
    let toml = r#"
[pins]
clock = 6
data = 5

[acquisition]
reads_until_valid = 6
gain = 64
busy_timeout_ms = 800
poll_interval_ms = 5

[filter]
alpha = 32

[calibration]
tare = -1024
adjuster = 870

[logging]
file = "hx711.log"
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    let cal = cfg.calibration.expect("calibration present");
    assert_eq!(cal.tare, -1024);
    assert_eq!(cal.adjuster, 870);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn missing_pins_is_a_parse_error() {
    let err = load_toml("[filter]\nalpha = 1\n").expect_err("pins are required");
    assert!(format!("{err}").contains("pins"));
}
