//! Error types for backend domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing backend domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendDomainError {
    /// The backend identifier is empty after trimming.
    #[error("backend identifier must not be empty")]
    EmptyIdentifier,

    /// The backend identifier contains characters outside `[A-Za-z0-9._-]`.
    #[error(
        "backend identifier '{0}' contains invalid characters (only ASCII letters, digits, '.', '_' and '-' allowed)"
    )]
    InvalidIdentifier(String),

    /// The backend identifier exceeds the length limit.
    #[error("backend identifier exceeds 128 character limit: {0}")]
    IdentifierTooLong(String),

    /// A backend descriptor carries no executable.
    #[error("backend '{0}' has no executable")]
    EmptyExecutable(String),
}

/// Error returned when parsing a backend status from an unknown string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown backend status: {0}")]
pub struct ParseBackendStatusError(pub String);

/// Error returned when parsing an unknown capability token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability token: {0}")]
pub struct ParseCapabilityError(pub String);

/// Error returned when parsing an unknown error-kind token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown error kind token: {0}")]
pub struct ParseErrorKindError(pub String);
