//! Backend wrapper hosting a provider in-process.

use crate::backend::{BackendCore, RegistrationOutcome};
use crate::backend::domain::{
    BackendIdentifier, BackendStatus, ErrorKind, OutboundRequest, RequestPayload,
};
use crate::backend::ports::{ProviderPlugin, ProviderReplies};
use crate::backend::wrapper::BackendWrapper;
use async_trait::async_trait;
use mockable::Clock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Backend wrapper running a [`ProviderPlugin`] on the tokio runtime.
///
/// Launching registers the plugin's capabilities and copyright right away.
/// Requests run as spawned tasks, so replies never arrive while the caller
/// is still issuing them.
pub struct PluginBackend {
    core: Arc<BackendCore>,
    plugin: Option<Arc<dyn ProviderPlugin>>,
    runtime: Mutex<Option<Handle>>,
}

impl PluginBackend {
    /// Creates a stopped backend for `plugin`.
    ///
    /// A backend without a plugin fails on launch; this is how a manager
    /// represents an executable naming an unknown plugin.
    #[must_use]
    pub fn new(
        identifier: BackendIdentifier,
        executable: impl Into<String>,
        arguments: BTreeMap<String, String>,
        plugin: Option<Arc<dyn ProviderPlugin>>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: Arc::new(BackendCore::new(identifier, executable, arguments, clock)),
            plugin,
            runtime: Mutex::new(None),
        })
    }

    fn runtime(&self) -> MutexGuard<'_, Option<Handle>> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BackendWrapper for PluginBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    async fn launch(&self) {
        let status = self.core.status();
        if status != BackendStatus::Stopped {
            warn!(
                backend = %self.core.identifier(),
                %status,
                "ignoring launch of a backend that is not stopped"
            );
            return;
        }

        self.core.set_status(BackendStatus::Launching);
        let Some(plugin) = self.plugin.as_ref() else {
            self.core.fail(format!(
                "No provider plugin named '{}'",
                self.core.executable()
            ));
            return;
        };

        *self.runtime() = Some(Handle::current());
        info!(backend = %self.core.identifier(), "launching plugin backend");
        match self
            .core
            .accept_registration(plugin.capabilities(), plugin.copyright())
        {
            RegistrationOutcome::Accepted | RegistrationOutcome::Ignored => {}
            RegistrationOutcome::Rejected(reason) => self.core.fail(reason),
        }
    }

    async fn stop(&self) {
        if !self.core.status().can_stop() {
            return;
        }
        self.core.set_status(BackendStatus::Stopping);
        *self.runtime() = None;
        info!(backend = %self.core.identifier(), "plugin backend stopped");
        self.core.set_status(BackendStatus::Stopped);
    }

    async fn kill(&self) {
        if self.core.status() == BackendStatus::Stopped {
            return;
        }
        *self.runtime() = None;
        info!(backend = %self.core.identifier(), "plugin backend killed");
        self.core.set_status(BackendStatus::Stopped);
    }

    fn forward(&self, request: OutboundRequest) {
        let runtime = self.runtime().clone();
        let ready = self.core.status().accepts_requests();
        let (true, Some(plugin), Some(runtime)) = (ready, self.plugin.clone(), runtime) else {
            self.core.register_error(
                request.request_id(),
                ErrorKind::Other,
                "Backend is not launched".to_owned(),
            );
            return;
        };

        let replies: Arc<dyn ProviderReplies> = self.core.clone();
        let (request_id, payload) = request.into_parts();
        runtime.spawn(async move {
            match payload {
                RequestPayload::SuggestStations { partial_station } => {
                    plugin
                        .retrieve_suggested_stations(request_id, partial_station, replies)
                        .await;
                }
                RequestPayload::SuggestLines { partial_line } => {
                    plugin
                        .retrieve_suggested_lines(request_id, partial_line, replies)
                        .await;
                }
                RequestPayload::RidesFromStation { station } => {
                    plugin
                        .retrieve_rides_from_station(request_id, station, replies)
                        .await;
                }
            }
        });
    }
}

impl fmt::Debug for PluginBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBackend")
            .field("core", &self.core)
            .field("has_plugin", &self.plugin.is_some())
            .finish_non_exhaustive()
    }
}
