//! Maps `Box<dyn Error>` from the line boundary to typed `Hx711Error`.
//!
//! `hx711_traits::Lines::configure` returns `Box<dyn Error + Send + Sync>` so
//! any backend can plug in; this module converts those to our typed enum,
//! with an optional feature-gated path for `hx711_hardware::HwError`.

use crate::error::Hx711Error;

/// Map a line-boundary error to a typed `Hx711Error`.
///
/// Known hardware error types are downcast first; anything else is carried
/// as its display string.
pub fn map_line_error(e: &(dyn std::error::Error + 'static)) -> Hx711Error {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<hx711_hardware::error::HwError>() {
            return match hw {
                hx711_hardware::error::HwError::UnknownLine(line) => {
                    Hx711Error::Config(format!("line {line} is not available on this backend"))
                }
                other => Hx711Error::LineFault(other.to_string()),
            };
        }
    }

    Hx711Error::Line(e.to_string())
}
