//! Error kinds a backend may resolve a request with.

use super::ParseErrorKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a request failure reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ErrorKind {
    /// The reply type did not match the request type.
    InvalidRequestType,
    /// The backend does not implement the request.
    NotImplemented,
    /// The backend hit an operational problem, such as a network failure.
    BackendWarning,
    /// Any other failure.
    Other,
}

impl ErrorKind {
    /// Returns the token exchanged with backends.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequestType => "error:invalid_request_type",
            Self::NotImplemented => "error:not_implemented",
            Self::BackendWarning => "error:backend_warning",
            Self::Other => "error:other",
        }
    }

    /// Returns whether the error should be surfaced to users.
    #[must_use]
    pub const fn is_user_visible(self) -> bool {
        !matches!(self, Self::InvalidRequestType)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ErrorKind {
    type Error = ParseErrorKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "error:invalid_request_type" => Ok(Self::InvalidRequestType),
            "error:not_implemented" => Ok(Self::NotImplemented),
            "error:backend_warning" => Ok(Self::BackendWarning),
            "error:other" => Ok(Self::Other),
            _ => Err(ParseErrorKindError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for ErrorKind {
    type Error = ParseErrorKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(value: ErrorKind) -> Self {
        value.as_str().to_owned()
    }
}
