//! Provider answering from a fixed in-memory catalog.

use crate::backend::domain::{Capabilities, Capability, ErrorKind, RequestId};
use crate::backend::ports::{ProviderPlugin, ProviderReplies};
use crate::entity::{CompanyNode, EntityKind, Line, Station, TransportEntity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process provider serving a fixed set of stations, lines and rides.
///
/// Suggestions match case-insensitively on any part of the name. A
/// capability is advertised as soon as the catalog holds data for it.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    copyright: String,
    stations: Vec<Station>,
    lines: Vec<Line>,
    rides: HashMap<String, Vec<CompanyNode>>,
}

impl StaticProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new(copyright: impl Into<String>) -> Self {
        Self {
            copyright: copyright.into(),
            ..Self::default()
        }
    }

    /// Adds a station to the suggestion catalog.
    #[must_use]
    pub fn with_station(mut self, station: Station) -> Self {
        self.stations.push(station);
        self
    }

    /// Adds a line to the suggestion catalog.
    #[must_use]
    pub fn with_line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    /// Sets the rides departing from the station with `station_identifier`.
    #[must_use]
    pub fn with_rides(
        mut self,
        station_identifier: impl Into<String>,
        companies: Vec<CompanyNode>,
    ) -> Self {
        self.rides.insert(station_identifier.into(), companies);
        self
    }

    fn not_implemented(request: RequestId, replies: &dyn ProviderReplies, what: &str) {
        replies.error_retrieved(
            request,
            ErrorKind::NotImplemented,
            format!("{what} are not provided"),
        );
    }
}

fn matching<K: EntityKind>(
    entities: &[TransportEntity<K>],
    partial: &str,
) -> Vec<TransportEntity<K>> {
    let needle = partial.trim().to_lowercase();
    entities
        .iter()
        .filter(|entity| entity.name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[async_trait]
impl ProviderPlugin for StaticProvider {
    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Vec::new();
        if !self.stations.is_empty() {
            capabilities.push(Capability::SuggestStationFromString);
        }
        if !self.lines.is_empty() {
            capabilities.push(Capability::SuggestLineFromString);
        }
        if !self.rides.is_empty() {
            capabilities.push(Capability::RidesFromStation);
        }
        capabilities.into_iter().collect()
    }

    fn copyright(&self) -> String {
        self.copyright.clone()
    }

    async fn retrieve_suggested_stations(
        &self,
        request: RequestId,
        partial_station: String,
        replies: Arc<dyn ProviderReplies>,
    ) {
        if self.stations.is_empty() {
            Self::not_implemented(request, replies.as_ref(), "station suggestions");
            return;
        }
        replies.suggested_stations_retrieved(request, matching(&self.stations, &partial_station));
    }

    async fn retrieve_suggested_lines(
        &self,
        request: RequestId,
        partial_line: String,
        replies: Arc<dyn ProviderReplies>,
    ) {
        if self.lines.is_empty() {
            Self::not_implemented(request, replies.as_ref(), "line suggestions");
            return;
        }
        replies.suggested_lines_retrieved(request, matching(&self.lines, &partial_line));
    }

    async fn retrieve_rides_from_station(
        &self,
        request: RequestId,
        station: Station,
        replies: Arc<dyn ProviderReplies>,
    ) {
        if self.rides.is_empty() {
            Self::not_implemented(request, replies.as_ref(), "rides");
            return;
        }
        match self.rides.get(station.identifier()) {
            Some(companies) => replies.rides_from_station_retrieved(request, companies.clone()),
            None => replies.error_retrieved(
                request,
                ErrorKind::BackendWarning,
                format!("No rides known for station '{}'", station.name()),
            ),
        }
    }
}
