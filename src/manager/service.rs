//! Backend manager service.

use super::BackendFactory;
use crate::backend::BackendWrapper;
use crate::backend::domain::{BackendIdentifier, BackendStatus};
use crate::events::{EventHub, EventListener, SubscriptionId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Change to the set of managed backends.
#[derive(Clone)]
pub enum ManagerEvent {
    /// A backend was added. It is still `Stopped`.
    BackendAdded(Arc<dyn BackendWrapper>),
    /// A backend was killed and removed.
    BackendRemoved(BackendIdentifier),
}

impl ManagerEvent {
    /// Returns the identifier of the affected backend.
    #[must_use]
    pub fn identifier(&self) -> &BackendIdentifier {
        match self {
            Self::BackendAdded(backend) => backend.identifier(),
            Self::BackendRemoved(identifier) => identifier,
        }
    }
}

impl fmt::Debug for ManagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendAdded(backend) => f
                .debug_tuple("BackendAdded")
                .field(backend.identifier())
                .finish(),
            Self::BackendRemoved(identifier) => {
                f.debug_tuple("BackendRemoved").field(identifier).finish()
            }
        }
    }
}

/// Registry of backend wrappers keyed by identifier.
pub struct BackendManager {
    factory: Arc<dyn BackendFactory>,
    backends: RwLock<BTreeMap<BackendIdentifier, Arc<dyn BackendWrapper>>>,
    events: EventHub<ManagerEvent>,
}

impl BackendManager {
    /// Creates an empty manager using `factory` for new backends.
    #[must_use]
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            factory,
            backends: RwLock::new(BTreeMap::new()),
            events: EventHub::new(),
        }
    }

    /// Adds a backend, or returns the existing one with the same identifier.
    ///
    /// A new backend starts `Stopped`; [`ManagerEvent::BackendAdded`] is
    /// published before this returns.
    pub fn add_backend(
        &self,
        identifier: BackendIdentifier,
        executable: &str,
        arguments: BTreeMap<String, String>,
    ) -> Arc<dyn BackendWrapper> {
        let backend = {
            let mut backends = self.write();
            if let Some(existing) = backends.get(&identifier) {
                debug!(backend = %identifier, "backend already added");
                return Arc::clone(existing);
            }
            let created = self
                .factory
                .create(identifier.clone(), executable, arguments);
            backends.insert(identifier, Arc::clone(&created));
            created
        };

        info!(
            backend = %backend.identifier(),
            executable,
            "backend added"
        );
        self.events
            .emit(&ManagerEvent::BackendAdded(Arc::clone(&backend)));
        backend
    }

    /// Returns whether a backend with `identifier` exists.
    #[must_use]
    pub fn contains(&self, identifier: &BackendIdentifier) -> bool {
        self.read().contains_key(identifier)
    }

    /// Returns the backend with `identifier`.
    #[must_use]
    pub fn backend(&self, identifier: &BackendIdentifier) -> Option<Arc<dyn BackendWrapper>> {
        self.read().get(identifier).cloned()
    }

    /// Returns every backend, ordered by identifier.
    #[must_use]
    pub fn backends(&self) -> Vec<Arc<dyn BackendWrapper>> {
        self.read().values().cloned().collect()
    }

    /// Returns every identifier in order.
    #[must_use]
    pub fn identifiers(&self) -> Vec<BackendIdentifier> {
        self.read().keys().cloned().collect()
    }

    /// Launches a backend. Returns `false` when it is unknown.
    pub async fn launch_backend(&self, identifier: &BackendIdentifier) -> bool {
        let Some(backend) = self.backend(identifier) else {
            debug!(backend = %identifier, "cannot launch unknown backend");
            return false;
        };
        backend.launch().await;
        true
    }

    /// Stops a backend. Returns `false` when it is unknown.
    pub async fn stop_backend(&self, identifier: &BackendIdentifier) -> bool {
        let Some(backend) = self.backend(identifier) else {
            debug!(backend = %identifier, "cannot stop unknown backend");
            return false;
        };
        backend.stop().await;
        true
    }

    /// Kills and removes a backend. Returns `false` when it is unknown.
    pub async fn remove_backend(&self, identifier: &BackendIdentifier) -> bool {
        let Some(backend) = self.backend(identifier) else {
            return false;
        };
        backend.kill().await;

        let removed = self.write().remove(identifier).is_some();
        if removed {
            info!(backend = %identifier, "backend removed");
            self.events
                .emit(&ManagerEvent::BackendRemoved(identifier.clone()));
        }
        removed
    }

    /// Retires every backend concurrently.
    ///
    /// Running backends are stopped and given up to `timeout` to exit
    /// before they are killed; `Invalid` backends are killed straight
    /// away. The whole teardown is bounded by a single `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        let mut retiring = JoinSet::new();
        for backend in self.backends() {
            retiring.spawn(async move { retire(backend.as_ref(), timeout).await });
        }
        while let Some(joined) = retiring.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "backend teardown task failed");
            }
        }
    }

    /// Subscribes a listener to backend additions and removals.
    pub fn subscribe(&self, listener: Weak<dyn EventListener<ManagerEvent>>) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Cancels a subscription.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.events.unsubscribe(subscription)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<BackendIdentifier, Arc<dyn BackendWrapper>>> {
        self.backends.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<BackendIdentifier, Arc<dyn BackendWrapper>>> {
        self.backends.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn retire(backend: &dyn BackendWrapper, timeout: Duration) {
    match backend.status() {
        BackendStatus::Stopped => {}
        BackendStatus::Invalid => backend.kill().await,
        BackendStatus::Launching | BackendStatus::Launched | BackendStatus::Stopping => {
            backend.stop().await;
            if !backend.wait_for_stopped(timeout).await {
                warn!(
                    backend = %backend.identifier(),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "backend did not stop in time, killing it"
                );
                backend.kill().await;
            }
        }
    }
}

impl fmt::Debug for BackendManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendManager")
            .field("backends", &self.identifiers())
            .finish_non_exhaustive()
    }
}
