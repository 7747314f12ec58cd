//! Launcher configuration for subprocess backends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default program substituted for the provider placeholder.
pub const DEFAULT_PROVIDER_PATH: &str = "pt2-provider";
/// Default placeholder replaced in executable strings.
pub const DEFAULT_PLACEHOLDER: &str = "$PROVIDER";
/// Default bound for waiting on a stopping backend, in milliseconds.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;

/// How subprocess backends are started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    provider_path: String,
    placeholder: String,
    working_directory: Option<PathBuf>,
    stop_timeout_ms: u64,
}

impl LauncherConfig {
    /// Parses a configuration document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherConfigError::Parse`] when the document is not valid
    /// JSON or has unknown fields, or [`LauncherConfigError::EmptyValue`]
    /// when the provider path or placeholder is blank.
    pub fn from_json_str(document: &str) -> Result<Self, LauncherConfigError> {
        let config: Self = serde_json::from_str(document).map_err(LauncherConfigError::parse)?;
        config.validate()
    }

    /// Sets the program substituted for the placeholder.
    #[must_use]
    pub fn with_provider_path(mut self, provider_path: impl Into<String>) -> Self {
        self.provider_path = provider_path.into();
        self
    }

    /// Sets the placeholder replaced in executable strings.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Sets the working directory of spawned backends.
    #[must_use]
    pub fn with_working_directory(mut self, working_directory: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(working_directory.into());
        self
    }

    /// Sets how long teardown waits for a stopping backend.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the program substituted for the placeholder.
    #[must_use]
    pub fn provider_path(&self) -> &str {
        &self.provider_path
    }

    /// Returns the placeholder replaced in executable strings.
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns the working directory of spawned backends, if any.
    #[must_use]
    pub fn working_directory(&self) -> Option<&std::path::Path> {
        self.working_directory.as_deref()
    }

    /// Returns how long teardown waits for a stopping backend.
    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    fn validate(self) -> Result<Self, LauncherConfigError> {
        if self.provider_path.trim().is_empty() {
            return Err(LauncherConfigError::EmptyValue("provider_path"));
        }
        if self.placeholder.trim().is_empty() {
            return Err(LauncherConfigError::EmptyValue("placeholder"));
        }
        Ok(self)
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            provider_path: DEFAULT_PROVIDER_PATH.to_owned(),
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            working_directory: None,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

/// Errors returned while loading launcher configuration.
#[derive(Debug, Clone, Error)]
pub enum LauncherConfigError {
    /// The document could not be parsed.
    #[error("invalid launcher configuration: {0}")]
    Parse(Arc<serde_json::Error>),

    /// A required value is blank.
    #[error("launcher configuration field '{0}' must not be empty")]
    EmptyValue(&'static str),
}

impl LauncherConfigError {
    fn parse(err: serde_json::Error) -> Self {
        Self::Parse(Arc::new(err))
    }
}
