//! Fixed-point sample arithmetic.
//!
//! Readings are `i32` values holding the chip's 24-bit two's-complement
//! sample in the upper 24 bits, i.e. the ADC count multiplied by 256. The
//! low byte is zero for transferred samples and gives the smoothing filter
//! room for fractional state.

/// Number of data bits the chip shifts out per conversion.
pub const SAMPLE_BITS: u32 = 24;
/// Mask selecting the 24 data bits of a shifted-in word.
pub const SAMPLE_MASK: u32 = 0x00FF_FFFF;
/// Scale between an ADC count and the fixed-point representation.
pub const FIXED_SCALE: i32 = 256;

/// Place a 24-bit two's-complement word in the upper 24 bits of an `i32`.
///
/// The sign bit of the sample lands on bit 31, so sign extension falls out
/// of the shift; bits above the 24th in `word` are ignored.
#[inline]
pub fn sample_to_fixed(word: u32) -> i32 {
    ((word & SAMPLE_MASK) << 8) as i32
}

/// Sign-extend a 24-bit two's-complement word to a plain ADC count.
#[inline]
pub fn sign_extend_24(word: u32) -> i32 {
    sample_to_fixed(word) >> 8
}

/// Plain ADC count of a fixed-point reading (arithmetic shift, floors).
#[inline]
pub fn fixed_to_counts(raw: i32) -> i32 {
    raw >> 8
}

/// One exponential smoothing step:
/// `smoothed + ((raw - smoothed) / 256) * alpha`.
///
/// Division truncates toward zero *before* the multiplication, so deltas
/// smaller than 256 in magnitude leave `smoothed` unchanged. Uses 64-bit
/// intermediates; with `alpha < 256` the result lies between `smoothed` and
/// `raw` and always fits in `i32`.
#[inline]
pub fn ema_step(smoothed: i32, raw: i32, alpha: u8) -> i32 {
    let delta = i64::from(raw) - i64::from(smoothed);
    let step = (delta / i64::from(FIXED_SCALE)) * i64::from(alpha);
    (i64::from(smoothed) + step) as i32
}
