use hx711_traits::LineId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Hx711Error {
    #[error("line error: {0}")]
    Line(String),
    #[error("line fault: {0}")]
    LineFault(String),
    #[error("adjuster is zero; calibrate with adjust_to() or set_adjuster() first")]
    ZeroAdjuster,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing clock/data pins")]
    MissingPins,
    #[error("clock and data must be different lines (both are {0})")]
    SharedLine(LineId),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
