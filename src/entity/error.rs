//! Error types for transportation entity construction and decoding.

use thiserror::Error;

/// Errors returned while constructing or decoding transportation entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityDomainError {
    /// The identifier is empty after trimming.
    #[error("{kind} identifier must not be empty")]
    EmptyIdentifier {
        /// Entity kind label, such as `station`.
        kind: &'static str,
    },

    /// A decoded entity carries attributes but no identifier.
    #[error("{kind} '{name}' carries attributes but has no identifier")]
    MissingIdentifier {
        /// Entity kind label, such as `station`.
        kind: &'static str,
        /// Name carried by the rejected entity.
        name: String,
    },
}
