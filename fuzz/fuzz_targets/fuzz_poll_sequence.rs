#![no_main]
use hx711_core::mocks::ScriptedLines;
use hx711_core::{Gain, Hx711, Source, Status};
use hx711_traits::ManualClock;
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Sample(u32),
    Busy(bool),
    HoldClock(bool),
    Advance(u16),
    Poll,
    SetGain(u8),
    SetAlpha(u8),
    SetReadsUntilValid(u8),
    PowerDown,
    PowerUp,
    Tare(bool),
    AdjustTo(i32, bool),
    SetAdjuster(i32),
    Adjusted(bool),
}

fn source(smoothed: bool) -> Source {
    if smoothed { Source::Smoothed } else { Source::Raw }
}

fuzz_target!(|input: (u32, Vec<Op>)| {
    let (start, ops) = input;
    let clock = ManualClock::starting_at(start);
    let lines = ScriptedLines::new(6, 5);
    let Ok(mut hx) = Hx711::new(lines.clone(), clock.clone(), 6, 5) else {
        return;
    };

    for op in ops {
        match op {
            Op::Sample(w) => lines.set_sample_word(w),
            Op::Busy(b) => lines.set_busy(b),
            Op::HoldClock(h) => lines.hold_clock_high(h),
            Op::Advance(ms) => clock.advance(u32::from(ms)),
            Op::Poll => {
                let before = (hx.status(), hx.raw(Source::Raw));
                let done = hx.poll();
                let status = hx.status();
                if status != before.0 && matches!(status, Status::PoweredDown | Status::TimedOut) {
                    assert!(done);
                }
                if done && status != Status::Valid {
                    assert_eq!(hx.raw(Source::Raw), before.1);
                }
            }
            Op::SetGain(g) => hx.set_gain(match g % 3 {
                0 => Gain::Gain128,
                1 => Gain::Gain64,
                _ => Gain::Gain32,
            }),
            Op::SetAlpha(a) => hx.set_alpha(a),
            Op::SetReadsUntilValid(n) => hx.set_reads_until_valid(n),
            Op::PowerDown => hx.power_down(),
            Op::PowerUp => hx.power_up(),
            Op::Tare(s) => hx.tare(source(s)),
            Op::AdjustTo(v, s) => hx.adjust_to(v, source(s)),
            Op::SetAdjuster(a) => hx.set_adjuster(a),
            Op::Adjusted(s) => {
                let _ = hx.adjusted(source(s));
            }
        }
        assert!(hx.settling_count() <= hx.reads_until_valid());
        assert_eq!(hx.raw(Source::Raw) & 0xFF, 0);
    }
});
