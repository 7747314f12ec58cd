//! Shared world state for station search BDD scenarios.

use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use transit_hub::backend::adapters::{InMemoryTransport, LauncherConfig};
use transit_hub::backend::domain::{BackendIdentifier, EndpointId, RequestId};
use transit_hub::manager::{BackendManager, ProcessBackendFactory};
use transit_hub::model::StationSearchModel;

/// Command line of a provider that stays up until it is terminated.
pub const LONG_RUNNING: &str = "sh -c 'exec sleep 30' provider";

/// Scenario world for station search behaviour tests.
pub struct SearchWorld {
    /// Transport carrying requests to the backends.
    pub transport: InMemoryTransport,
    /// Manager owning every backend.
    pub manager: Arc<BackendManager>,
    /// The model under test.
    pub model: Option<Arc<StationSearchModel>>,
}

impl SearchWorld {
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
            manager: Arc::new(BackendManager::new(Arc::new(factory))),
            model: None,
        }
    }

    /// Returns the model under test.
    pub fn model(&self) -> Result<Arc<StationSearchModel>, eyre::Report> {
        self.model
            .clone()
            .ok_or_else(|| eyre::eyre!("no search model in scenario world"))
    }

    /// Returns the requests sent to backend `name`, oldest first.
    pub fn requests_to(&self, name: &str) -> Result<Vec<RequestId>, eyre::Report> {
        let endpoint = EndpointId::for_backend(&BackendIdentifier::new(name)?);
        Ok(self
            .transport
            .sent_requests()?
            .into_iter()
            .filter(|(sent_to, _)| *sent_to == endpoint)
            .map(|(_, request)| request.request_id())
            .collect())
    }
}

impl Default for SearchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SearchWorld {
    SearchWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
