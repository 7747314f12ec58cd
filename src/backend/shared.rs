//! State shared by every backend wrapper implementation.
//!
//! [`BackendCore`] owns the status machine, the last error, the advertised
//! capabilities and copyright, and the table of pending requests. All of it
//! sits behind one mutex so that a reply's lookup and removal happen
//! atomically. Events are published after the mutex is released.

use crate::backend::domain::{
    BackendEvent, BackendIdentifier, BackendStatus, Capabilities, ErrorKind, PendingRequest,
    RequestId, RequestType,
};
use crate::backend::ports::ProviderReplies;
use crate::entity::{CompanyNode, Line, Station};
use crate::events::{EventHub, EventListener, SubscriptionId};
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Error recorded when a backend registers before it was launched.
pub const REGISTERED_WHILE_NOT_LAUNCHING: &str =
    "Backend is registering while not yet launched";
/// Error recorded when a backend registers a second time.
pub const REGISTERED_TWICE: &str = "Backend is registering twice";

/// Outcome of a backend's self-registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The backend moved from `Launching` to `Launched`.
    Accepted,
    /// The registration violates the lifecycle; the backend must be killed
    /// and marked invalid with the given reason.
    Rejected(&'static str),
    /// The backend is already invalid and the registration was dropped.
    Ignored,
}

#[derive(Debug, Default)]
struct CoreState {
    status: BackendStatus,
    last_error: String,
    capabilities: Capabilities,
    copyright: String,
    requests: HashMap<RequestId, PendingRequest>,
}

/// Status machine and request table of one backend.
pub struct BackendCore {
    identifier: BackendIdentifier,
    executable: String,
    arguments: BTreeMap<String, String>,
    clock: Arc<dyn Clock + Send + Sync>,
    state: Mutex<CoreState>,
    status_watch: watch::Sender<BackendStatus>,
    events: EventHub<BackendEvent>,
}

impl BackendCore {
    /// Creates a stopped backend core.
    #[must_use]
    pub fn new(
        identifier: BackendIdentifier,
        executable: impl Into<String>,
        arguments: BTreeMap<String, String>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let (status_watch, _) = watch::channel(BackendStatus::Stopped);
        Self {
            identifier,
            executable: executable.into(),
            arguments,
            clock,
            state: Mutex::new(CoreState::default()),
            status_watch,
            events: EventHub::new(),
        }
    }

    /// Returns the operator-assigned identifier.
    #[must_use]
    pub const fn identifier(&self) -> &BackendIdentifier {
        &self.identifier
    }

    /// Returns the configured executable string.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Returns the configured launch arguments.
    #[must_use]
    pub const fn arguments(&self) -> &BTreeMap<String, String> {
        &self.arguments
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> BackendStatus {
        self.lock().status
    }

    /// Returns the most recent lifecycle error, or an empty string.
    #[must_use]
    pub fn last_error(&self) -> String {
        self.lock().last_error.clone()
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.lock().capabilities.clone()
    }

    /// Returns the advertised copyright notice.
    #[must_use]
    pub fn copyright(&self) -> String {
        self.lock().copyright.clone()
    }

    /// Returns a snapshot of unresolved requests, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        let mut pending: Vec<PendingRequest> = self.lock().requests.values().cloned().collect();
        pending.sort_by_key(PendingRequest::issued_at);
        pending
    }

    /// Returns whether `request` is still unresolved.
    #[must_use]
    pub fn is_pending(&self, request: RequestId) -> bool {
        self.lock().requests.contains_key(&request)
    }

    /// Subscribes a listener to this backend's events.
    pub fn subscribe(&self, listener: Weak<dyn EventListener<BackendEvent>>) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Cancels a subscription made with [`BackendCore::subscribe`].
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.events.unsubscribe(subscription)
    }

    /// Waits until the backend reaches `target` or `timeout` elapses.
    ///
    /// Returns whether the status was reached.
    pub async fn wait_for_status(&self, target: BackendStatus, timeout: Duration) -> bool {
        let mut receiver = self.status_watch.subscribe();
        let reached =
            tokio::time::timeout(timeout, receiver.wait_for(|status| *status == target)).await;
        matches!(reached, Ok(Ok(_)))
    }

    /// Moves to `status`, publishing a notification when it changed.
    ///
    /// Entering `Stopped` or `Invalid` abandons every pending request.
    /// Returns whether the status changed. The notification is published
    /// after the lock is released and may interleave with a concurrent
    /// transition; the stored status is authoritative.
    pub fn set_status(&self, status: BackendStatus) -> bool {
        let (previous, abandoned) = {
            let mut state = self.lock();
            if state.status == status {
                return false;
            }
            let previous = std::mem::replace(&mut state.status, status);
            self.status_watch.send_replace(status);
            let abandoned = if matches!(status, BackendStatus::Stopped | BackendStatus::Invalid) {
                state.requests.drain().count()
            } else {
                0
            };
            (previous, abandoned)
        };

        debug!(
            backend = %self.identifier,
            from = %previous,
            to = %status,
            "backend status changed"
        );
        if abandoned > 0 {
            debug!(
                backend = %self.identifier,
                abandoned,
                "abandoned pending requests"
            );
        }
        self.events.emit(&BackendEvent::StatusChanged {
            backend: self.identifier.clone(),
            status,
        });
        true
    }

    /// Records a lifecycle error. The last error always wins.
    pub fn set_last_error(&self, message: impl Into<String>) {
        let error = message.into();
        warn!(backend = %self.identifier, error = %error, "backend error");
        self.lock().last_error = error;
    }

    /// Records a lifecycle error and moves to `Invalid`.
    pub fn fail(&self, message: impl Into<String>) {
        self.set_last_error(message);
        self.set_status(BackendStatus::Invalid);
    }

    /// Applies a backend's self-registration.
    ///
    /// Only a `Launching` backend is accepted; its capabilities and
    /// copyright are stored before it becomes `Launched`. The caller is
    /// responsible for killing a rejected backend.
    pub fn accept_registration(
        &self,
        capabilities: Capabilities,
        copyright: String,
    ) -> RegistrationOutcome {
        let mut events = Vec::new();
        let outcome = {
            let mut state = self.lock();
            match state.status {
                BackendStatus::Launching => {
                    if state.capabilities != capabilities {
                        events.push(BackendEvent::CapabilitiesChanged {
                            backend: self.identifier.clone(),
                            capabilities: capabilities.clone(),
                        });
                        state.capabilities = capabilities;
                    }
                    if state.copyright != copyright {
                        events.push(BackendEvent::CopyrightChanged {
                            backend: self.identifier.clone(),
                            copyright: copyright.clone(),
                        });
                        state.copyright = copyright;
                    }
                    state.status = BackendStatus::Launched;
                    self.status_watch.send_replace(BackendStatus::Launched);
                    events.push(BackendEvent::StatusChanged {
                        backend: self.identifier.clone(),
                        status: BackendStatus::Launched,
                    });
                    RegistrationOutcome::Accepted
                }
                BackendStatus::Stopped | BackendStatus::Stopping => {
                    RegistrationOutcome::Rejected(REGISTERED_WHILE_NOT_LAUNCHING)
                }
                BackendStatus::Launched => RegistrationOutcome::Rejected(REGISTERED_TWICE),
                BackendStatus::Invalid => RegistrationOutcome::Ignored,
            }
        };

        match outcome {
            RegistrationOutcome::Accepted => {
                debug!(backend = %self.identifier, "backend registered");
            }
            RegistrationOutcome::Rejected(reason) => {
                warn!(backend = %self.identifier, reason, "rejecting backend registration");
            }
            RegistrationOutcome::Ignored => {
                warn!(
                    backend = %self.identifier,
                    "ignoring registration of an invalid backend"
                );
            }
        }
        self.events.emit_all(events);
        outcome
    }

    /// Stores a new pending request and returns its identifier.
    pub fn create_request(&self, request_type: RequestType) -> RequestId {
        let pending = PendingRequest::new(request_type, &*self.clock);
        let id = pending.id();
        self.lock().requests.insert(id, pending);
        debug!(
            backend = %self.identifier,
            request = %id,
            request_type = %request_type,
            "request created"
        );
        id
    }

    /// Resolves a request with an error.
    ///
    /// Unknown or already resolved requests are ignored.
    pub fn register_error(&self, request: RequestId, kind: ErrorKind, message: String) {
        let Some(pending) = self.take(request) else {
            return;
        };
        debug!(
            backend = %self.identifier,
            request = %request,
            request_type = %pending.request_type(),
            kind = %kind,
            "request resolved with error"
        );
        self.events.emit(&BackendEvent::ErrorRegistered {
            backend: self.identifier.clone(),
            request,
            kind,
            message,
        });
    }

    /// Resolves a station suggestion request.
    pub fn register_suggested_stations(&self, request: RequestId, stations: Vec<Station>) {
        self.resolve(request, RequestType::SuggestStation, |backend| {
            BackendEvent::SuggestedStationsRegistered {
                backend,
                request,
                stations,
            }
        });
    }

    /// Resolves a line suggestion request.
    pub fn register_suggested_lines(&self, request: RequestId, lines: Vec<Line>) {
        self.resolve(request, RequestType::SuggestLine, |backend| {
            BackendEvent::SuggestedLinesRegistered {
                backend,
                request,
                lines,
            }
        });
    }

    /// Resolves a rides-from-station request.
    pub fn register_rides_from_station(&self, request: RequestId, companies: Vec<CompanyNode>) {
        self.resolve(request, RequestType::RidesFromStation, |backend| {
            BackendEvent::RidesFromStationRegistered {
                backend,
                request,
                companies,
            }
        });
    }

    fn resolve<F>(&self, request: RequestId, received: RequestType, build: F)
    where
        F: FnOnce(BackendIdentifier) -> BackendEvent,
    {
        let Some(pending) = self.take(request) else {
            return;
        };

        let event = if pending.request_type() == received {
            debug!(
                backend = %self.identifier,
                request = %request,
                request_type = %received,
                "request resolved"
            );
            build(self.identifier.clone())
        } else {
            warn!(
                backend = %self.identifier,
                request = %request,
                expected = %pending.request_type(),
                received = %received,
                "reply type does not match request type"
            );
            BackendEvent::ErrorRegistered {
                backend: self.identifier.clone(),
                request,
                kind: ErrorKind::InvalidRequestType,
                message: format!(
                    "Invalid request type: expected {}, received {received}",
                    pending.request_type()
                ),
            }
        };
        self.events.emit(&event);
    }

    fn take(&self, request: RequestId) -> Option<PendingRequest> {
        let taken = self.lock().requests.remove(&request);
        if taken.is_none() {
            debug!(
                backend = %self.identifier,
                request = %request,
                "ignoring reply for unknown request"
            );
        }
        taken
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for BackendCore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BackendCore")
            .field("identifier", &self.identifier)
            .field("executable", &self.executable)
            .field("arguments", &self.arguments)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl ProviderReplies for BackendCore {
    fn error_retrieved(&self, request: RequestId, kind: ErrorKind, message: String) {
        self.register_error(request, kind, message);
    }

    fn suggested_stations_retrieved(&self, request: RequestId, stations: Vec<Station>) {
        self.register_suggested_stations(request, stations);
    }

    fn suggested_lines_retrieved(&self, request: RequestId, lines: Vec<Line>) {
        self.register_suggested_lines(request, lines);
    }

    fn rides_from_station_retrieved(&self, request: RequestId, companies: Vec<CompanyNode>) {
        self.register_rides_from_station(request, companies);
    }
}
