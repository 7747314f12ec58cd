//! Identifier types for the backend domain.

use super::BackendDomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Maximum length for an operator-assigned backend identifier.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Unique identifier for one request issued to a backend.
///
/// Identifiers are random and never reused, so a late reply can never be
/// mistaken for the answer to a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a request identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator-assigned backend identifier, such as `de_db` or `ch.sbb`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackendIdentifier(String);

impl BackendIdentifier {
    /// Creates a validated backend identifier.
    ///
    /// The input is trimmed. Only characters in `[A-Za-z0-9._-]` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BackendDomainError::EmptyIdentifier`] when the value is empty
    /// after trimming, [`BackendDomainError::IdentifierTooLong`] when it
    /// exceeds 128 characters, or [`BackendDomainError::InvalidIdentifier`]
    /// when it contains other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, BackendDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(BackendDomainError::EmptyIdentifier);
        }

        if trimmed.len() > MAX_IDENTIFIER_LENGTH {
            return Err(BackendDomainError::IdentifierTooLong(raw));
        }

        let is_valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !is_valid {
            return Err(BackendDomainError::InvalidIdentifier(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BackendIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BackendIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BackendIdentifier {
    type Error = BackendDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BackendIdentifier {
    type Error = BackendDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BackendIdentifier> for String {
    fn from(value: BackendIdentifier) -> Self {
        value.0
    }
}

/// Transport endpoint a launched backend registers against.
///
/// The endpoint is the lowercase hex SHA-256 digest of the backend
/// identifier and is handed to the process as `--identifier <endpoint>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// Derives the endpoint of a backend.
    #[must_use]
    pub fn for_backend(identifier: &BackendIdentifier) -> Self {
        let digest = Sha256::digest(identifier.as_str().as_bytes());
        Self(format!("{digest:x}"))
    }

    /// Returns the endpoint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
