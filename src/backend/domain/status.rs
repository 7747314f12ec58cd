//! Backend lifecycle status.

use super::ParseBackendStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status of a backend wrapper.
///
/// ```text
/// Stopped ──launch──▶ Launching ──register──▶ Launched
///    ▲                    │                      │
///    └──── exit ◀── Stopping ◀──── stop ─────────┘
/// ```
///
/// Any running state may fall into `Invalid` on an unrecoverable failure;
/// `kill` returns every state to `Stopped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStatus {
    /// No process is running.
    #[default]
    Stopped,
    /// The process was spawned and has not registered yet.
    Launching,
    /// The backend registered and accepts requests.
    Launched,
    /// Termination was requested and exit has not been confirmed.
    Stopping,
    /// The backend failed and must be killed before it can relaunch.
    Invalid,
}

impl BackendStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Launching => "launching",
            Self::Launched => "launched",
            Self::Stopping => "stopping",
            Self::Invalid => "invalid",
        }
    }

    /// Returns whether the backend can answer requests.
    #[must_use]
    pub const fn accepts_requests(self) -> bool {
        matches!(self, Self::Launched)
    }

    /// Returns whether `stop` applies in this state.
    #[must_use]
    pub const fn can_stop(self) -> bool {
        matches!(self, Self::Launching | Self::Launched)
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BackendStatus {
    type Error = ParseBackendStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "stopped" => Ok(Self::Stopped),
            "launching" => Ok(Self::Launching),
            "launched" => Ok(Self::Launched),
            "stopping" => Ok(Self::Stopping),
            "invalid" => Ok(Self::Invalid),
            _ => Err(ParseBackendStatusError(value.to_owned())),
        }
    }
}
