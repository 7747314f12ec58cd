//! Notifications published by backend wrappers.

use super::{BackendIdentifier, BackendStatus, Capabilities, ErrorKind, RequestId};
use crate::entity::{CompanyNode, Line, Station};

/// A change observed on one backend wrapper.
///
/// Status, capability and copyright notifications fire only when the value
/// actually changes. Every request produces exactly one of the four
/// resolution variants.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// The lifecycle status changed.
    ///
    /// Emission happens after the wrapper's lock is released, so two
    /// transitions racing on different threads may be delivered out of
    /// order. Listeners that need the current status must re-read
    /// `status()` instead of caching this value.
    StatusChanged {
        /// Backend that changed.
        backend: BackendIdentifier,
        /// New status.
        status: BackendStatus,
    },
    /// The advertised capabilities changed.
    CapabilitiesChanged {
        /// Backend that changed.
        backend: BackendIdentifier,
        /// New capability set.
        capabilities: Capabilities,
    },
    /// The copyright notice changed.
    CopyrightChanged {
        /// Backend that changed.
        backend: BackendIdentifier,
        /// New copyright text.
        copyright: String,
    },
    /// A request was resolved with an error.
    ErrorRegistered {
        /// Backend that resolved the request.
        backend: BackendIdentifier,
        /// Resolved request.
        request: RequestId,
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
    /// A station suggestion request was answered.
    SuggestedStationsRegistered {
        /// Backend that resolved the request.
        backend: BackendIdentifier,
        /// Resolved request.
        request: RequestId,
        /// Suggested stations.
        stations: Vec<Station>,
    },
    /// A line suggestion request was answered.
    SuggestedLinesRegistered {
        /// Backend that resolved the request.
        backend: BackendIdentifier,
        /// Resolved request.
        request: RequestId,
        /// Suggested lines.
        lines: Vec<Line>,
    },
    /// A rides-from-station request was answered.
    RidesFromStationRegistered {
        /// Backend that resolved the request.
        backend: BackendIdentifier,
        /// Resolved request.
        request: RequestId,
        /// Ride tree grouped by company and line.
        companies: Vec<CompanyNode>,
    },
}

impl BackendEvent {
    /// Returns the backend the event originates from.
    #[must_use]
    pub const fn backend(&self) -> &BackendIdentifier {
        match self {
            Self::StatusChanged { backend, .. }
            | Self::CapabilitiesChanged { backend, .. }
            | Self::CopyrightChanged { backend, .. }
            | Self::ErrorRegistered { backend, .. }
            | Self::SuggestedStationsRegistered { backend, .. }
            | Self::SuggestedLinesRegistered { backend, .. }
            | Self::RidesFromStationRegistered { backend, .. } => backend,
        }
    }

    /// Returns the resolved request for resolution events.
    #[must_use]
    pub const fn request(&self) -> Option<RequestId> {
        match self {
            Self::ErrorRegistered { request, .. }
            | Self::SuggestedStationsRegistered { request, .. }
            | Self::SuggestedLinesRegistered { request, .. }
            | Self::RidesFromStationRegistered { request, .. } => Some(*request),
            Self::StatusChanged { .. }
            | Self::CapabilitiesChanged { .. }
            | Self::CopyrightChanged { .. } => None,
        }
    }
}
