//! Listener lifecycle states.

use std::fmt;

/// What a listener is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListenerState {
    /// Waiting for the next tick or for new committed entries.
    #[default]
    Idle,
    /// Submitting a window of the log.
    Applying,
    /// Applying rows of a snapshot.
    InstallingSnapshot,
    /// Writing the checkpoint after an accepted batch.
    Persisting,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Applying => "applying",
            Self::InstallingSnapshot => "installing_snapshot",
            Self::Persisting => "persisting",
        };
        f.write_str(name)
    }
}
