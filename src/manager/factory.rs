//! Strategies choosing the wrapper implementation for new backends.

use crate::backend::BackendWrapper;
use crate::backend::adapters::{LauncherConfig, PluginBackend, ProcessBackend};
use crate::backend::domain::BackendIdentifier;
use crate::backend::ports::{BackendTransport, ProviderPlugin};
use mockable::Clock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Creates the wrapper for a newly added backend.
pub trait BackendFactory: Send + Sync {
    /// Builds a stopped wrapper.
    fn create(
        &self,
        identifier: BackendIdentifier,
        executable: &str,
        arguments: BTreeMap<String, String>,
    ) -> Arc<dyn BackendWrapper>;
}

/// Factory producing subprocess backends connected through one transport.
#[derive(Clone)]
pub struct ProcessBackendFactory {
    config: Arc<LauncherConfig>,
    transport: Arc<dyn BackendTransport>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ProcessBackendFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new(
        config: LauncherConfig,
        transport: Arc<dyn BackendTransport>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            clock,
        }
    }

    /// Returns the launcher configuration shared by created backends.
    #[must_use]
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }
}

impl BackendFactory for ProcessBackendFactory {
    fn create(
        &self,
        identifier: BackendIdentifier,
        executable: &str,
        arguments: BTreeMap<String, String>,
    ) -> Arc<dyn BackendWrapper> {
        ProcessBackend::new(
            identifier,
            executable,
            arguments,
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            Arc::clone(&self.clock),
        )
    }
}

impl fmt::Debug for ProcessBackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessBackendFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Factory producing in-process backends from registered plugins.
///
/// The executable string names the plugin, optionally prefixed with the
/// provider placeholder (`$PROVIDER vbb` and `vbb` both select `vbb`).
#[derive(Clone)]
pub struct PluginBackendFactory {
    placeholder: String,
    plugins: BTreeMap<String, Arc<dyn ProviderPlugin>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PluginBackendFactory {
    /// Creates a factory without plugins.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            placeholder: LauncherConfig::default().placeholder().to_owned(),
            plugins: BTreeMap::new(),
            clock,
        }
    }

    /// Registers a plugin under `name`.
    #[must_use]
    pub fn with_plugin(mut self, name: impl Into<String>, plugin: Arc<dyn ProviderPlugin>) -> Self {
        self.plugins.insert(name.into(), plugin);
        self
    }

    /// Returns the registered plugin names.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    fn plugin_name<'a>(&self, executable: &'a str) -> &'a str {
        let trimmed = executable.trim();
        trimmed
            .strip_prefix(self.placeholder.as_str())
            .unwrap_or(trimmed)
            .trim()
    }
}

impl BackendFactory for PluginBackendFactory {
    fn create(
        &self,
        identifier: BackendIdentifier,
        executable: &str,
        arguments: BTreeMap<String, String>,
    ) -> Arc<dyn BackendWrapper> {
        let plugin = self.plugins.get(self.plugin_name(executable)).cloned();
        PluginBackend::new(
            identifier,
            executable,
            arguments,
            plugin,
            Arc::clone(&self.clock),
        )
    }
}

impl fmt::Debug for PluginBackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBackendFactory")
            .field("plugins", &self.plugin_names())
            .finish_non_exhaustive()
    }
}
