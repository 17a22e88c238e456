use hx711_core::error::BuildError;
use hx711_core::mocks::ScriptedLines;
use hx711_core::{Calibration, Gain, Hx711, Hx711Error};
use hx711_traits::{LineMode, ManualClock};
use rstest::rstest;

#[rstest]
fn builder_missing_pins_yields_typed_build_error() {
    let err = Hx711::builder()
        .with_lines(ScriptedLines::new(6, 5))
        .with_clock(ManualClock::new())
        // missing with_pins()
        .build()
        .expect_err("should fail with MissingPins");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingPins) => {}
        other => panic!("expected MissingPins, got: {other:?}"),
    }
}

#[rstest]
fn builder_rejects_shared_line() {
    let err = Hx711::builder()
        .with_lines(ScriptedLines::new(5, 5))
        .with_clock(ManualClock::new())
        .with_pins(5, 5)
        .build()
        .expect_err("clock and data on one line");

    assert_eq!(err.downcast_ref::<BuildError>(), Some(&BuildError::SharedLine(5)));
}

#[rstest]
fn builder_rejects_zero_busy_timeout() {
    let err = Hx711::builder()
        .with_lines(ScriptedLines::new(6, 5))
        .with_clock(ManualClock::new())
        .with_pins(6, 5)
        .with_busy_timeout_ms(0)
        .build()
        .expect_err("zero timeout");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(msg)) if msg.contains("busy_timeout_ms")
    ));
}

#[rstest]
fn builder_rejects_zero_adjuster() {
    let err = Hx711::builder()
        .with_lines(ScriptedLines::new(6, 5))
        .with_clock(ManualClock::new())
        .with_pins(6, 5)
        .with_calibration(Calibration {
            tare: 0,
            adjuster: 0,
        })
        .build()
        .expect_err("zero adjuster");

    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(msg)) if msg.contains("adjuster")
    ));
}

#[rstest]
fn configure_failure_surfaces_as_line_error() {
    let err = Hx711::new(
        ScriptedLines::new(6, 5).failing_configure(),
        ManualClock::new(),
        6,
        5,
    )
    .expect_err("configure fails");

    match err.downcast_ref::<Hx711Error>() {
        Some(Hx711Error::Line(msg)) => assert!(msg.contains("unavailable"), "{msg}"),
        other => panic!("expected Line error, got: {other:?}"),
    }
    assert!(format!("{err:#}").contains("configure data line 5"));
}

#[rstest]
fn builder_applies_settings_and_calibration() {
    let lines = ScriptedLines::new(6, 5);
    let hx = Hx711::builder()
        .with_lines(lines.clone())
        .with_clock(ManualClock::new())
        .with_pins(6, 5)
        .with_reads_until_valid(6)
        .with_gain(Gain::Gain64)
        .with_alpha(64)
        .with_busy_timeout_ms(150)
        .apply_calibration(Some(Calibration {
            tare: -512,
            adjuster: 1_000,
        }))
        .build()
        .expect("valid builder");

    assert_eq!(hx.reads_until_valid(), 6);
    assert_eq!(hx.gain(), Gain::Gain64);
    assert_eq!(hx.alpha(), 64);
    assert_eq!(hx.busy_timeout_ms(), 150);
    assert_eq!(hx.tare_offset(), -512);
    assert_eq!(hx.adjuster(), 1_000);
    assert_eq!(
        lines.configured(),
        vec![(5, LineMode::InputPullUp), (6, LineMode::Output)]
    );
}

#[rstest]
fn absent_persisted_calibration_keeps_defaults() {
    let hx = Hx711::builder()
        .with_lines(ScriptedLines::new(6, 5))
        .with_clock(ManualClock::new())
        .with_pins(6, 5)
        .apply_calibration(None::<Calibration>)
        .build()
        .expect("valid builder");

    assert_eq!(hx.calibration(), Calibration::default());
}
