//! Port contracts for talking to backends.
//!
//! [`BackendTransport`] carries requests to out-of-process backends and
//! delivers their registration and replies through [`BackendCallbacks`].
//! [`ProviderPlugin`] is the contract for in-process providers, which answer
//! through a [`ProviderReplies`] sink.

mod provider;
mod transport;

pub use provider::{ProviderPlugin, ProviderReplies};
pub use transport::{BackendCallbacks, BackendTransport, TransportError, TransportResult};

#[cfg(test)]
pub use transport::MockBackendTransport;
