//! Transport port connecting the manager to out-of-process backends.

use super::ProviderReplies;
use crate::backend::domain::{Capabilities, EndpointId, OutboundRequest};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Receiver of everything a launched backend sends back.
#[async_trait]
pub trait BackendCallbacks: ProviderReplies {
    /// Handles the backend's self-registration.
    async fn register_backend(&self, capabilities: Capabilities, copyright: String);
}

/// Message channel between the manager process and backend processes.
///
/// Endpoints are registered before a backend is spawned and unregistered
/// once it has exited. Sending is fire-and-forget; replies arrive later
/// through the endpoint's [`BackendCallbacks`].
#[cfg_attr(test, mockall::automock)]
pub trait BackendTransport: Send + Sync {
    /// Registers the callback receiver of an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::EndpointInUse`] when the endpoint is
    /// already registered.
    fn register_endpoint(
        &self,
        endpoint: &EndpointId,
        callbacks: Weak<dyn BackendCallbacks>,
    ) -> TransportResult<()>;

    /// Removes an endpoint. Unknown endpoints are ignored.
    fn unregister_endpoint(&self, endpoint: &EndpointId);

    /// Sends a request to the backend behind an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownEndpoint`] when nothing is registered
    /// under the endpoint, or [`TransportError::Delivery`] when the message
    /// could not be handed over.
    fn send(&self, endpoint: &EndpointId, request: OutboundRequest) -> TransportResult<()>;
}

/// Errors returned by transport adapters.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Another backend already owns the endpoint.
    #[error("transport endpoint {0} is already registered")]
    EndpointInUse(EndpointId),

    /// No backend is registered under the endpoint.
    #[error("transport endpoint {0} is not registered")]
    UnknownEndpoint(EndpointId),

    /// The message could not be delivered.
    #[error("transport delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps a delivery error from the transport adapter.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
