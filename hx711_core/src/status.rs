//! Status of the most recent conversion cycle.

/// Terminal (or in-progress) state reported after each poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    /// Chip was reset (power-up, gain change, timeout) and has not yet
    /// produced `reads_until_valid` transfers.
    #[default]
    Init,
    /// The last reading is valid.
    Valid,
    /// The clock line was observed high: the chip is in power-down mode.
    PoweredDown,
    /// The data line stayed high past the busy timeout; the chip is
    /// probably disconnected or unpowered.
    TimedOut,
}

impl Status {
    /// Stable lowercase name, used in logs and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Init => "init",
            Status::Valid => "valid",
            Status::PoweredDown => "powered_down",
            Status::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
