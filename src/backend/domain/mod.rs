//! Domain model for provider backends.
//!
//! Backends are identified by an operator-assigned [`BackendIdentifier`],
//! move through the [`BackendStatus`] lifecycle, advertise
//! [`Capabilities`], and resolve uniquely identified requests
//! ([`RequestId`]) with typed results or an [`ErrorKind`]. Every observable
//! change is published as a [`BackendEvent`].

mod capability;
mod error;
mod error_kind;
mod event;
mod ids;
mod request;
mod status;

pub use capability::{Capabilities, Capability};
pub use error::{
    BackendDomainError, ParseBackendStatusError, ParseCapabilityError, ParseErrorKindError,
};
pub use error_kind::ErrorKind;
pub use event::BackendEvent;
pub use ids::{BackendIdentifier, EndpointId, RequestId};
pub use request::{OutboundRequest, PendingRequest, RequestPayload, RequestType};
pub use status::BackendStatus;
