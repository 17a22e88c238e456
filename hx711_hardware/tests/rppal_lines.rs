#![cfg(all(feature = "hardware", target_os = "linux"))]

use hx711_hardware::RppalLines;
use hx711_traits::{LineMode, Lines};

// NOTE: These only run on a Raspberry Pi with the gpio character device
// accessible; lines are not expected to be wired to anything.

#[test]
fn configures_and_reads_back_driven_output() {
    let mut lines = RppalLines::new().expect("open gpio");
    let line = 6u8; // adjust for your test rig
    lines.configure(line, LineMode::Output).expect("configure");
    lines.write(line, hx711_traits::Level::High);
    assert!(lines.read(line).is_high());
    lines.write(line, hx711_traits::Level::Low);
    assert!(!lines.read(line).is_high());
}

#[test]
fn unconfigured_line_reads_low() {
    let mut lines = RppalLines::new().expect("open gpio");
    assert!(!lines.read(27).is_high());
}
