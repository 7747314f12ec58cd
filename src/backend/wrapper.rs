//! Common interface of backend wrapper implementations.

use crate::backend::BackendCore;
use crate::backend::domain::{
    BackendEvent, BackendIdentifier, BackendStatus, Capabilities, OutboundRequest,
    PendingRequest, RequestId, RequestPayload,
};
use crate::entity::Station;
use crate::events::{EventListener, SubscriptionId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Weak;
use std::time::Duration;

/// A backend as seen by the manager and the models.
///
/// Implementations differ only in how they run the provider and move
/// requests to it; status, errors and request correlation live in the
/// shared [`BackendCore`].
///
/// Requests are issued in two steps so that callers can start tracking an
/// identifier before any reply can arrive: [`BackendWrapper::prepare_request`]
/// records the pending request, [`BackendWrapper::forward`] hands it to the
/// provider. [`BackendWrapper::request`] does both.
#[async_trait]
pub trait BackendWrapper: Send + Sync {
    /// Returns the shared state of this backend.
    fn core(&self) -> &BackendCore;

    /// Starts the backend. Ignored unless the backend is `Stopped`.
    async fn launch(&self);

    /// Asks the backend to terminate without waiting for it.
    async fn stop(&self);

    /// Terminates the backend and waits until it is `Stopped`.
    async fn kill(&self);

    /// Hands a prepared request to the provider.
    fn forward(&self, request: OutboundRequest);

    /// Returns the operator-assigned identifier.
    fn identifier(&self) -> &BackendIdentifier {
        self.core().identifier()
    }

    /// Returns the configured executable string.
    fn executable(&self) -> &str {
        self.core().executable()
    }

    /// Returns the configured launch arguments.
    fn arguments(&self) -> &BTreeMap<String, String> {
        self.core().arguments()
    }

    /// Returns the current status.
    fn status(&self) -> BackendStatus {
        self.core().status()
    }

    /// Returns the most recent lifecycle error.
    fn last_error(&self) -> String {
        self.core().last_error()
    }

    /// Returns the advertised capabilities.
    fn capabilities(&self) -> Capabilities {
        self.core().capabilities()
    }

    /// Returns the advertised copyright notice.
    fn copyright(&self) -> String {
        self.core().copyright()
    }

    /// Returns a snapshot of unresolved requests.
    fn pending_requests(&self) -> Vec<PendingRequest> {
        self.core().pending_requests()
    }

    /// Subscribes a listener to this backend's events.
    fn subscribe(&self, listener: Weak<dyn EventListener<BackendEvent>>) -> SubscriptionId {
        self.core().subscribe(listener)
    }

    /// Cancels a subscription.
    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.core().unsubscribe(subscription)
    }

    /// Waits up to `timeout` for the backend to reach `Stopped`.
    async fn wait_for_stopped(&self, timeout: Duration) -> bool {
        self.core()
            .wait_for_status(BackendStatus::Stopped, timeout)
            .await
    }

    /// Records a pending request without sending it.
    fn prepare_request(&self, payload: RequestPayload) -> OutboundRequest {
        let request_id = self.core().create_request(payload.request_type());
        OutboundRequest::new(request_id, payload)
    }

    /// Records and sends a request, returning its identifier.
    fn request(&self, payload: RequestPayload) -> RequestId {
        let request = self.prepare_request(payload);
        let request_id = request.request_id();
        self.forward(request);
        request_id
    }

    /// Asks for stations matching partial text.
    fn request_suggested_stations(&self, partial_station: &str) -> RequestId {
        self.request(RequestPayload::SuggestStations {
            partial_station: partial_station.to_owned(),
        })
    }

    /// Asks for lines matching partial text.
    fn request_suggested_lines(&self, partial_line: &str) -> RequestId {
        self.request(RequestPayload::SuggestLines {
            partial_line: partial_line.to_owned(),
        })
    }

    /// Asks for rides departing from a station.
    fn request_rides_from_station(&self, station: &Station) -> RequestId {
        self.request(RequestPayload::RidesFromStation {
            station: station.clone(),
        })
    }
}
