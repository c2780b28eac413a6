/// Worker state definitions
///
/// A worker cycles Polling → Fetching → Extracting → Polling while the
/// frontier has work, drops to Idle when a poll times out, and ends in Stopped.
use std::fmt;

/// The phase a worker is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Waiting on the frontier for the next location
    Polling,

    /// Retrieving content for a popped location
    Fetching,

    /// Turning fetched content into newly discovered locations
    Extracting,

    /// The last poll timed out without any work
    Idle,

    /// Shutdown was observed; the worker has left its loop
    Stopped,
}

impl WorkerState {
    /// Returns true while the worker holds a popped location
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Fetching | Self::Extracting)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;

        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => !self.is_busy(),
            (Polling, Fetching) | (Polling, Idle) => true,
            (Idle, Polling) => true,
            (Fetching, Extracting) | (Fetching, Polling) => true,
            (Extracting, Polling) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
