//! Gain/channel selection.
//!
//! The chip latches the gain for the *next* conversion from the number of
//! clock pulses that follow the 24 data bits. That pulse count is an
//! implementation detail of the protocol and is kept apart from the public
//! enumeration.

/// Input channel and amplification factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gain {
    /// Channel B, gain 32.
    Gain32,
    /// Channel A, gain 64.
    Gain64,
    /// Channel A, gain 128. Power-on default of the chip.
    #[default]
    Gain128,
}

/// Input channel selected by a [`Gain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

impl Gain {
    /// Clock pulses issued after the 24 data bits to select this gain.
    #[inline]
    pub const fn extra_pulses(self) -> u8 {
        match self {
            Gain::Gain128 => 1,
            Gain::Gain32 => 2,
            Gain::Gain64 => 3,
        }
    }

    pub const fn factor(self) -> u8 {
        match self {
            Gain::Gain32 => 32,
            Gain::Gain64 => 64,
            Gain::Gain128 => 128,
        }
    }

    pub const fn channel(self) -> Channel {
        match self {
            Gain::Gain32 => Channel::B,
            Gain::Gain64 | Gain::Gain128 => Channel::A,
        }
    }
}
