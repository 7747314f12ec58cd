//! Requests issued to backends and awaiting resolution.

use super::{Capability, RequestId};
use crate::entity::Station;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query family of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Station suggestions from partial text.
    SuggestStation,
    /// Line suggestions from partial text.
    SuggestLine,
    /// Rides departing from a station.
    RidesFromStation,
}

impl RequestType {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuggestStation => "suggest_station",
            Self::SuggestLine => "suggest_line",
            Self::RidesFromStation => "rides_from_station",
        }
    }

    /// Returns the capability a backend must advertise to answer this type.
    #[must_use]
    pub const fn required_capability(self) -> Capability {
        match self {
            Self::SuggestStation => Capability::SuggestStationFromString,
            Self::SuggestLine => Capability::SuggestLineFromString,
            Self::RidesFromStation => Capability::RidesFromStation,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request awaiting its single terminal reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    id: RequestId,
    request_type: RequestType,
    issued_at: DateTime<Utc>,
}

impl PendingRequest {
    /// Creates a pending request stamped with the clock's current time.
    #[must_use]
    pub fn new(request_type: RequestType, clock: &(impl Clock + ?Sized)) -> Self {
        Self {
            id: RequestId::new(),
            request_type,
            issued_at: clock.utc(),
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the request type.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// Returns when the request was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Arguments of a request sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestPayload {
    /// Suggest stations matching partial text.
    SuggestStations {
        /// Text typed so far.
        partial_station: String,
    },
    /// Suggest lines matching partial text.
    SuggestLines {
        /// Text typed so far.
        partial_line: String,
    },
    /// List rides departing from a station.
    RidesFromStation {
        /// Station previously suggested by the same backend.
        station: Station,
    },
}

impl RequestPayload {
    /// Returns the request type this payload belongs to.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        match self {
            Self::SuggestStations { .. } => RequestType::SuggestStation,
            Self::SuggestLines { .. } => RequestType::SuggestLine,
            Self::RidesFromStation { .. } => RequestType::RidesFromStation,
        }
    }
}

/// A request ready to be forwarded to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    request_id: RequestId,
    payload: RequestPayload,
}

impl OutboundRequest {
    /// Pairs a request identifier with its payload.
    #[must_use]
    pub const fn new(request_id: RequestId, payload: RequestPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the request payload.
    #[must_use]
    pub const fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    /// Splits the request into identifier and payload.
    #[must_use]
    pub fn into_parts(self) -> (RequestId, RequestPayload) {
        (self.request_id, self.payload)
    }
}
