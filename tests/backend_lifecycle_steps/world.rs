//! Shared world state for backend lifecycle BDD scenarios.

use mockable::DefaultClock;
use rstest::fixture;
use std::collections::BTreeMap;
use std::sync::Arc;
use transit_hub::backend::BackendWrapper;
use transit_hub::backend::adapters::{InMemoryTransport, LauncherConfig};
use transit_hub::backend::domain::{BackendIdentifier, EndpointId};
use transit_hub::manager::{BackendManager, ProcessBackendFactory};

/// Command line of a provider that stays up until it is terminated.
pub const LONG_RUNNING: &str = "sh -c 'exec sleep 30' provider";

/// Scenario world for backend lifecycle behaviour tests.
pub struct LifecycleWorld {
    /// Transport the backends register through.
    pub transport: InMemoryTransport,
    /// Manager owning the backend under test.
    pub manager: BackendManager,
    /// The backend under test.
    pub backend: Option<Arc<dyn BackendWrapper>>,
}

impl LifecycleWorld {
    /// Creates a world with an empty manager.
    #[must_use]
    pub fn new() -> Self {
        let transport = InMemoryTransport::new();
        let factory = ProcessBackendFactory::new(
            LauncherConfig::default(),
            Arc::new(transport.clone()),
            Arc::new(DefaultClock),
        );
        Self {
            transport,
            manager: BackendManager::new(Arc::new(factory)),
            backend: None,
        }
    }

    /// Adds a backend running `executable`.
    pub fn add(&mut self, name: &str, executable: &str) -> Result<(), eyre::Report> {
        let identifier = BackendIdentifier::new(name)?;
        self.backend = Some(
            self.manager
                .add_backend(identifier, executable, BTreeMap::new()),
        );
        Ok(())
    }

    /// Returns the backend under test.
    pub fn backend(&self) -> Result<Arc<dyn BackendWrapper>, eyre::Report> {
        self.backend
            .clone()
            .ok_or_else(|| eyre::eyre!("no backend in scenario world"))
    }

    /// Returns the transport endpoint of the backend under test.
    pub fn endpoint(&self) -> Result<EndpointId, eyre::Report> {
        Ok(EndpointId::for_backend(self.backend()?.identifier()))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
