/// Which reading a calibration or accessor call operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// The latest transferred sample.
    #[default]
    Raw,
    /// The exponentially smoothed sample.
    Smoothed,
}
