//! Error types for model data validation.

use thiserror::Error;

/// Reasons a rides reply is discarded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedRidesError {
    /// A ride node does not carry exactly one station.
    #[error("ride '{ride}' carries {count} stations, expected exactly one")]
    UnexpectedStationCount {
        /// Identifier of the offending ride.
        ride: String,
        /// Number of stations found.
        count: usize,
    },
}
