//! In-memory transport adapter.

use crate::backend::domain::{Capabilities, EndpointId, OutboundRequest};
use crate::backend::ports::{BackendCallbacks, BackendTransport, TransportError, TransportResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Transport keeping endpoints and sent requests in memory.
///
/// No process is involved: tests and local tools play the backend side by
/// reading [`InMemoryTransport::sent_requests`] and answering through
/// [`InMemoryTransport::callbacks`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<RwLock<TransportState>>,
}

#[derive(Debug, Default)]
struct TransportState {
    endpoints: HashMap<EndpointId, Weak<dyn BackendCallbacks>>,
    sent: Vec<(EndpointId, OutboundRequest)>,
    failing: bool,
}

impl InMemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail, or succeed again.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Delivery`] when lock acquisition fails.
    pub fn set_failing(&self, failing: bool) -> TransportResult<()> {
        self.write()?.failing = failing;
        Ok(())
    }

    /// Returns whether a live receiver is registered under `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Delivery`] when lock acquisition fails.
    pub fn is_registered(&self, endpoint: &EndpointId) -> TransportResult<bool> {
        Ok(self
            .read()?
            .endpoints
            .get(endpoint)
            .is_some_and(|callbacks| callbacks.strong_count() > 0))
    }

    /// Returns every request sent so far, in order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Delivery`] when lock acquisition fails.
    pub fn sent_requests(&self) -> TransportResult<Vec<(EndpointId, OutboundRequest)>> {
        Ok(self.read()?.sent.clone())
    }

    /// Removes and returns every request sent so far.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Delivery`] when lock acquisition fails.
    pub fn take_sent(&self) -> TransportResult<Vec<(EndpointId, OutboundRequest)>> {
        Ok(std::mem::take(&mut self.write()?.sent))
    }

    /// Returns the receiver registered under `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownEndpoint`] when no live receiver is
    /// registered, or [`TransportError::Delivery`] when lock acquisition
    /// fails.
    pub fn callbacks(&self, endpoint: &EndpointId) -> TransportResult<Arc<dyn BackendCallbacks>> {
        self.read()?
            .endpoints
            .get(endpoint)
            .and_then(Weak::upgrade)
            .ok_or_else(|| TransportError::UnknownEndpoint(endpoint.clone()))
    }

    /// Delivers a backend's self-registration to its endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnknownEndpoint`] when no live receiver is
    /// registered.
    pub async fn deliver_registration(
        &self,
        endpoint: &EndpointId,
        capabilities: Capabilities,
        copyright: impl Into<String>,
    ) -> TransportResult<()> {
        let callbacks = self.callbacks(endpoint)?;
        callbacks
            .register_backend(capabilities, copyright.into())
            .await;
        Ok(())
    }

    fn read(&self) -> TransportResult<RwLockReadGuard<'_, TransportState>> {
        self.state
            .read()
            .map_err(|err| TransportError::delivery(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TransportResult<RwLockWriteGuard<'_, TransportState>> {
        self.state
            .write()
            .map_err(|err| TransportError::delivery(std::io::Error::other(err.to_string())))
    }
}

impl BackendTransport for InMemoryTransport {
    fn register_endpoint(
        &self,
        endpoint: &EndpointId,
        callbacks: Weak<dyn BackendCallbacks>,
    ) -> TransportResult<()> {
        let mut state = self.write()?;
        let occupied = state
            .endpoints
            .get(endpoint)
            .is_some_and(|existing| existing.strong_count() > 0 && !existing.ptr_eq(&callbacks));
        if occupied {
            return Err(TransportError::EndpointInUse(endpoint.clone()));
        }
        state.endpoints.insert(endpoint.clone(), callbacks);
        Ok(())
    }

    fn unregister_endpoint(&self, endpoint: &EndpointId) {
        if let Ok(mut state) = self.write() {
            state.endpoints.remove(endpoint);
        }
    }

    fn send(&self, endpoint: &EndpointId, request: OutboundRequest) -> TransportResult<()> {
        let mut state = self.write()?;
        if state.failing {
            return Err(TransportError::delivery(std::io::Error::other(
                "in-memory transport is failing",
            )));
        }
        let registered = state
            .endpoints
            .get(endpoint)
            .is_some_and(|callbacks| callbacks.strong_count() > 0);
        if !registered {
            return Err(TransportError::UnknownEndpoint(endpoint.clone()));
        }
        state.sent.push((endpoint.clone(), request));
        Ok(())
    }
}
