//! Helpers shared by unit tests.

use crate::backend::domain::{
    BackendIdentifier, BackendStatus, Capabilities, Capability, ErrorKind, OutboundRequest,
    RequestId,
};
use crate::backend::{BackendCore, BackendWrapper, RegistrationOutcome};
use crate::entity::Station;
use crate::manager::BackendFactory;
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Polls `condition` until it holds or five seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn identifier(value: &str) -> BackendIdentifier {
    BackendIdentifier::new(value).expect("identifier should be valid")
}

pub fn station(identifier: &str, name: &str) -> Station {
    Station::new(identifier, name).expect("station should be valid")
}

pub fn clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(DefaultClock)
}

/// Backend that records forwarded requests and lets tests deliver replies
/// through its core in any order.
pub struct ScriptedBackend {
    core: BackendCore,
    capabilities: Capabilities,
    forwarded: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedBackend {
    pub fn new(name: &str, capabilities: Capabilities) -> Arc<Self> {
        Arc::new(Self {
            core: BackendCore::new(identifier(name), name, BTreeMap::new(), clock()),
            capabilities,
            forwarded: Mutex::new(Vec::new()),
        })
    }

    pub fn launched(name: &str, capabilities: Capabilities) -> Arc<Self> {
        let backend = Self::new(name, capabilities);
        backend.register();
        backend
    }

    pub fn forwarded(&self) -> Vec<OutboundRequest> {
        self.forwarded.lock().expect("forwarded lock").clone()
    }

    pub fn last_request(&self) -> RequestId {
        self.forwarded()
            .last()
            .map(OutboundRequest::request_id)
            .expect("a request should have been forwarded")
    }

    fn register(&self) {
        self.core.set_status(BackendStatus::Launching);
        let outcome = self
            .core
            .accept_registration(self.capabilities.clone(), format!("© {}", self.core.identifier()));
        assert_eq!(outcome, RegistrationOutcome::Accepted);
    }
}

#[async_trait]
impl BackendWrapper for ScriptedBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    async fn launch(&self) {
        if self.core.status() == BackendStatus::Stopped {
            self.register();
        }
    }

    async fn stop(&self) {
        self.core.set_status(BackendStatus::Stopped);
    }

    async fn kill(&self) {
        self.core.set_status(BackendStatus::Stopped);
    }

    fn forward(&self, request: OutboundRequest) {
        if self.core.status().accepts_requests() {
            self.forwarded.lock().expect("forwarded lock").push(request);
        } else {
            self.core.register_error(
                request.request_id(),
                ErrorKind::Other,
                "Backend is not launched".to_owned(),
            );
        }
    }
}

/// Factory creating [`ScriptedBackend`]s that advertise `capabilities`.
pub struct ScriptedFactory {
    pub capabilities: Capabilities,
}

impl BackendFactory for ScriptedFactory {
    fn create(
        &self,
        identifier: BackendIdentifier,
        _executable: &str,
        _arguments: BTreeMap<String, String>,
    ) -> Arc<dyn BackendWrapper> {
        ScriptedBackend::new(identifier.as_str(), self.capabilities.clone())
    }
}

pub fn capabilities(list: &[Capability]) -> Capabilities {
    list.iter().copied().collect()
}
