//! Driver against the protocol-level simulator, with time stepped the way a
//! 10 ms control loop would.

use hx711_core::{Gain, Hx711, Source, Status};
use hx711_hardware::sim::{CONVERSION_MS, POWER_UP_SETTLE_MS};
use hx711_hardware::{SimHandle, SimulatedHx711};
use hx711_traits::{Clock, ManualClock};

const CLK: u8 = 6;
const DAT: u8 = 5;
const STEP_MS: u32 = 10;

type Driver = Hx711<SimulatedHx711<ManualClock>, ManualClock>;

fn attach(counts: i32) -> (Driver, SimHandle, ManualClock) {
    let clock = ManualClock::new();
    let sim = SimulatedHx711::new(clock.clone(), CLK, DAT).with_counts(counts);
    let handle = sim.handle();
    let hx = Hx711::new(sim, clock.clone(), CLK, DAT).expect("attach");
    (hx, handle, clock)
}

/// Poll every `STEP_MS` until a poll concludes; panics after `limit_ms`.
fn run_until_concluded(hx: &mut Driver, clock: &ManualClock, limit_ms: u32) -> Status {
    let mut waited = 0;
    while !hx.poll() {
        assert!(waited < limit_ms, "no conclusion within {limit_ms} ms");
        clock.advance(STEP_MS);
        waited += STEP_MS;
    }
    hx.status()
}

#[test]
fn first_valid_reading_after_settle_and_three_conversions() {
    let (mut hx, _, clock) = attach(1_000);
    assert_eq!(run_until_concluded(&mut hx, &clock, 2_000), Status::Valid);
    assert_eq!(clock.now_ms(), POWER_UP_SETTLE_MS + 2 * CONVERSION_MS);
    assert_eq!(hx.timestamp(), POWER_UP_SETTLE_MS + CONVERSION_MS);
    assert_eq!(hx.counts(Source::Raw), 1_000);
    assert_eq!(hx.counts(Source::Smoothed), 1_000);
}

#[test]
fn steady_readings_track_load_changes() {
    let (mut hx, handle, clock) = attach(0);
    run_until_concluded(&mut hx, &clock, 2_000);
    handle.set_counts(10);
    clock.advance(STEP_MS);
    assert_eq!(run_until_concluded(&mut hx, &clock, 500), Status::Valid);
    assert_eq!(hx.raw(Source::Raw), 2_560);
    assert_eq!(hx.raw(Source::Smoothed), 2_000);
}

#[test]
fn gain_64_applies_from_the_following_conversion() {
    let (mut hx, _, clock) = attach(1_000);
    run_until_concluded(&mut hx, &clock, 2_000);
    hx.set_gain(Gain::Gain64);

    // the transfer that selects gain 64 still carries a gain-128 sample
    clock.advance(CONVERSION_MS);
    assert!(!hx.poll());
    assert_eq!(hx.counts(Source::Raw), 1_000);

    assert_eq!(run_until_concluded(&mut hx, &clock, 1_000), Status::Valid);
    assert_eq!(hx.counts(Source::Raw), 500);
    assert_eq!(hx.counts(Source::Smoothed), 500);
}

#[test]
fn channel_b_quarters_the_bridge_signal() {
    let (mut hx, _, clock) = attach(4_000);
    hx.set_gain(Gain::Gain32);
    assert_eq!(run_until_concluded(&mut hx, &clock, 2_000), Status::Valid);
    assert_eq!(hx.counts(Source::Raw), 1_000);
}

#[test]
fn out_of_range_signal_clamps_to_24_bits() {
    let (mut hx, _, clock) = attach(-9_000_000);
    run_until_concluded(&mut hx, &clock, 2_000);
    assert_eq!(hx.counts(Source::Raw), -0x80_0000);
    assert_eq!(hx.raw(Source::Raw), i32::MIN);
}

#[test]
fn power_cycle_resets_chip_and_resettles() {
    let (mut hx, _, clock) = attach(1_000);
    hx.set_gain(Gain::Gain64);
    run_until_concluded(&mut hx, &clock, 2_000);

    hx.power_down();
    assert!(hx.poll());
    assert_eq!(hx.status(), Status::PoweredDown);
    clock.advance(5_000);
    assert!(hx.poll());
    assert_eq!(hx.status(), Status::PoweredDown);

    hx.power_up();
    let started = clock.now_ms();
    assert_eq!(run_until_concluded(&mut hx, &clock, 2_000), Status::Valid);
    assert_eq!(
        clock.now_ms().wrapping_sub(started),
        POWER_UP_SETTLE_MS + 2 * CONVERSION_MS
    );
    // chip came back at gain 128; the driver re-selected 64 on the first transfer
    assert_eq!(hx.counts(Source::Raw), 500);
}

#[test]
fn disconnect_times_out_and_reconnect_recovers() {
    let (mut hx, handle, clock) = attach(321);
    run_until_concluded(&mut hx, &clock, 2_000);

    handle.set_connected(false);
    clock.advance(STEP_MS);
    assert_eq!(run_until_concluded(&mut hx, &clock, 1_000), Status::TimedOut);
    assert_eq!(hx.counts(Source::Raw), 321);

    handle.set_connected(true);
    clock.advance(STEP_MS);
    assert!(!hx.poll());
    assert_eq!(hx.status(), Status::Init);
    assert_eq!(hx.settling_count(), 1);
    assert_eq!(run_until_concluded(&mut hx, &clock, 1_000), Status::Valid);
}

#[test]
fn custom_busy_timeout_is_honoured() {
    let clock = ManualClock::new();
    let sim = SimulatedHx711::new(clock.clone(), CLK, DAT);
    sim.handle().set_connected(false);
    let mut hx = Hx711::builder()
        .with_lines(sim)
        .with_clock(clock.clone())
        .with_pins(CLK, DAT)
        .with_busy_timeout_ms(120)
        .build()
        .expect("attach");

    assert_eq!(run_until_concluded(&mut hx, &clock, 1_000), Status::TimedOut);
    assert_eq!(clock.now_ms(), 120);
}
