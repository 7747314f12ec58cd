//! Provider contract implemented by data-provider plugins.

use crate::backend::domain::{Capabilities, ErrorKind, RequestId};
use crate::entity::{CompanyNode, Line, Station};
use async_trait::async_trait;
use std::sync::Arc;

/// Sink receiving the single terminal reply of each request.
///
/// Every request handed to a provider must eventually produce exactly one
/// call: either [`ProviderReplies::error_retrieved`] or the typed method
/// matching the request. Replies for unknown or already resolved requests
/// are ignored by the receiver.
pub trait ProviderReplies: Send + Sync {
    /// Resolves a request with an error.
    fn error_retrieved(&self, request: RequestId, kind: ErrorKind, message: String);

    /// Resolves a station suggestion request.
    fn suggested_stations_retrieved(&self, request: RequestId, stations: Vec<Station>);

    /// Resolves a line suggestion request.
    fn suggested_lines_retrieved(&self, request: RequestId, lines: Vec<Line>);

    /// Resolves a rides-from-station request.
    fn rides_from_station_retrieved(&self, request: RequestId, companies: Vec<CompanyNode>);
}

/// A data provider hosted in-process.
#[async_trait]
pub trait ProviderPlugin: Send + Sync {
    /// Returns the capabilities the provider answers.
    fn capabilities(&self) -> Capabilities;

    /// Returns the provider's copyright notice.
    fn copyright(&self) -> String;

    /// Looks up stations matching partial text.
    async fn retrieve_suggested_stations(
        &self,
        request: RequestId,
        partial_station: String,
        replies: Arc<dyn ProviderReplies>,
    );

    /// Looks up lines matching partial text.
    async fn retrieve_suggested_lines(
        &self,
        request: RequestId,
        partial_line: String,
        replies: Arc<dyn ProviderReplies>,
    ) {
        let _ = partial_line;
        replies.error_retrieved(
            request,
            ErrorKind::NotImplemented,
            "line suggestions are not implemented".to_owned(),
        );
    }

    /// Lists rides departing from a station.
    async fn retrieve_rides_from_station(
        &self,
        request: RequestId,
        station: Station,
        replies: Arc<dyn ProviderReplies>,
    ) {
        let _ = station;
        replies.error_retrieved(
            request,
            ErrorKind::NotImplemented,
            "rides from station are not implemented".to_owned(),
        );
    }
}
