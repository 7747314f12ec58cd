//! Fan-out search models querying every capable backend at once.

use super::rows::{ModelEvent, RowModel};
use crate::backend::BackendWrapper;
use crate::backend::domain::{BackendEvent, BackendIdentifier, Capability, RequestId, RequestPayload};
use crate::entity::{Line, Station};
use crate::events::{EventHub, EventListener, SubscriptionId};
use crate::manager::{BackendManager, ManagerEvent};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

/// Minimum number of characters a query needs before it is sent.
pub const MIN_QUERY_LENGTH: usize = 3;

/// What a [`SearchModel`] asks for and how replies become rows.
pub trait SearchKind: Send + Sync + 'static {
    /// Row type produced from replies.
    type Row: Clone + Send + Sync + 'static;

    /// Capability a backend must advertise to be queried.
    const CAPABILITY: Capability;

    /// Builds the request payload for a trimmed query.
    fn payload(text: &str) -> RequestPayload;

    /// Extracts the request and rows from a matching reply event.
    fn rows_from(event: &BackendEvent) -> Option<(RequestId, Vec<Self::Row>)>;
}

/// Row of a station search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRow {
    /// Display name of the station.
    pub name: String,
    /// The suggested station.
    pub station: Station,
    /// Backend that suggested it.
    pub backend: BackendIdentifier,
}

/// Row of a line search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRow {
    /// Display name of the line.
    pub name: String,
    /// The suggested line.
    pub line: Line,
    /// Backend that suggested it.
    pub backend: BackendIdentifier,
}

/// Station suggestions from partial names.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationSearch;

impl SearchKind for StationSearch {
    type Row = StationRow;

    const CAPABILITY: Capability = Capability::SuggestStationFromString;

    fn payload(text: &str) -> RequestPayload {
        RequestPayload::SuggestStations {
            partial_station: text.to_owned(),
        }
    }

    fn rows_from(event: &BackendEvent) -> Option<(RequestId, Vec<StationRow>)> {
        let BackendEvent::SuggestedStationsRegistered {
            backend,
            request,
            stations,
        } = event
        else {
            return None;
        };
        let rows = stations
            .iter()
            .map(|station| StationRow {
                name: station.name().to_owned(),
                station: station.clone(),
                backend: backend.clone(),
            })
            .collect();
        Some((*request, rows))
    }
}

/// Line suggestions from partial names.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSearch;

impl SearchKind for LineSearch {
    type Row = LineRow;

    const CAPABILITY: Capability = Capability::SuggestLineFromString;

    fn payload(text: &str) -> RequestPayload {
        RequestPayload::SuggestLines {
            partial_line: text.to_owned(),
        }
    }

    fn rows_from(event: &BackendEvent) -> Option<(RequestId, Vec<LineRow>)> {
        let BackendEvent::SuggestedLinesRegistered {
            backend,
            request,
            lines,
        } = event
        else {
            return None;
        };
        let rows = lines
            .iter()
            .map(|line| LineRow {
                name: line.name().to_owned(),
                line: line.clone(),
                backend: backend.clone(),
            })
            .collect();
        Some((*request, rows))
    }
}

/// Search model over station suggestions.
pub type StationSearchModel = SearchModel<StationSearch>;

/// Search model over line suggestions.
pub type LineSearchModel = SearchModel<LineSearch>;

struct Attached {
    manager: Arc<BackendManager>,
    subscription: SubscriptionId,
}

struct SearchState<R> {
    rows: RowModel<R>,
    short: bool,
    manager: Option<Attached>,
    backends: HashMap<BackendIdentifier, (Arc<dyn BackendWrapper>, SubscriptionId)>,
}

/// Sends each query to every launched backend advertising
/// [`SearchKind::CAPABILITY`] and accumulates replies in completion order.
///
/// The model listens to the attached manager so that backends added later
/// are observed too. Requests are tracked before they are forwarded, so a
/// reply delivered synchronously by an in-process provider is never lost.
pub struct SearchModel<K: SearchKind> {
    state: Mutex<SearchState<K::Row>>,
    events: EventHub<ModelEvent>,
    self_ref: Weak<Self>,
    kind: PhantomData<K>,
}

impl<K: SearchKind> SearchModel<K> {
    /// Creates a detached model. Queries are short until text is searched.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(SearchState {
                rows: RowModel::new(),
                short: true,
                manager: None,
                backends: HashMap::new(),
            }),
            events: EventHub::new(),
            self_ref: self_ref.clone(),
            kind: PhantomData,
        })
    }

    /// Attaches to `manager`, or detaches when `None`.
    ///
    /// Rows and pending requests from the previous manager are dropped.
    pub fn set_backend_manager(&self, manager: Option<Arc<BackendManager>>) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            let unchanged = match (&state.manager, &manager) {
                (Some(current), Some(next)) => Arc::ptr_eq(&current.manager, next),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return;
            }

            if let Some(previous) = state.manager.take() {
                previous.manager.unsubscribe(previous.subscription);
            }
            for (backend, subscription) in state.backends.drain().map(|(_, entry)| entry) {
                backend.unsubscribe(subscription);
            }
            state.rows.clear(&mut events);

            if let Some(next) = manager {
                let listener: Weak<dyn EventListener<ManagerEvent>> = self.self_ref.clone();
                let subscription = next.subscribe(listener);
                for backend in next.backends() {
                    self.observe(&mut state, backend);
                }
                state.manager = Some(Attached {
                    manager: next,
                    subscription,
                });
            }
        }
        self.events.emit_all(events);
    }

    /// Returns the attached manager.
    #[must_use]
    pub fn backend_manager(&self) -> Option<Arc<BackendManager>> {
        self.lock()
            .manager
            .as_ref()
            .map(|attached| Arc::clone(&attached.manager))
    }

    /// Replaces the current results with a new query.
    ///
    /// Rows and pending requests are cleared first. Text shorter than
    /// [`MIN_QUERY_LENGTH`] characters after trimming is not sent.
    pub fn search(&self, text: &str) {
        let query = text.trim();
        let short = query.chars().count() < MIN_QUERY_LENGTH;
        let mut events = Vec::new();
        let mut outbound = Vec::new();
        {
            let mut state = self.lock();
            state.rows.clear(&mut events);
            if state.short != short {
                state.short = short;
                events.push(ModelEvent::ShortChanged(short));
            }

            if !short {
                let targets: Vec<Arc<dyn BackendWrapper>> = state
                    .backends
                    .values()
                    .map(|(backend, _)| Arc::clone(backend))
                    .filter(|backend| {
                        backend.status().accepts_requests()
                            && backend.capabilities().contains(K::CAPABILITY)
                    })
                    .collect();
                for backend in targets {
                    let request = backend.prepare_request(K::payload(query));
                    state.rows.track(
                        request.request_id(),
                        backend.identifier().clone(),
                        &mut events,
                    );
                    outbound.push((backend, request));
                }
            }
        }

        debug!(query, backends = outbound.len(), "search issued");
        self.events.emit_all(events);
        for (backend, request) in outbound {
            backend.forward(request);
        }
    }

    /// Drops every row and stops waiting for replies.
    pub fn clear(&self) {
        let mut events = Vec::new();
        self.lock().rows.clear(&mut events);
        self.events.emit_all(events);
    }

    /// Returns whether the last query was too short to send.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.lock().short
    }

    /// Returns whether replies are still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().rows.is_loading()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().rows.count()
    }

    /// Returns a copy of every row.
    #[must_use]
    pub fn rows(&self) -> Vec<K::Row> {
        self.lock().rows.rows().to_vec()
    }

    /// Returns a copy of the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<K::Row> {
        self.lock().rows.row(index).cloned()
    }

    /// Subscribes a listener to model changes.
    pub fn subscribe(&self, listener: Weak<dyn EventListener<ModelEvent>>) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Cancels a subscription.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.events.unsubscribe(subscription)
    }

    fn observe(&self, state: &mut SearchState<K::Row>, backend: Arc<dyn BackendWrapper>) {
        if state.backends.contains_key(backend.identifier()) {
            return;
        }
        let listener: Weak<dyn EventListener<BackendEvent>> = self.self_ref.clone();
        let subscription = backend.subscribe(listener);
        state
            .backends
            .insert(backend.identifier().clone(), (backend, subscription));
    }

    fn lock(&self) -> MutexGuard<'_, SearchState<K::Row>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SearchModel<StationSearch> {
    /// Returns the backend and station of the row at `index`, ready to be
    /// passed to [`crate::model::RidesFromStationModel::request_rides`].
    #[must_use]
    pub fn rides_target(&self, index: usize) -> Option<(Arc<dyn BackendWrapper>, Station)> {
        let state = self.lock();
        let row = state.rows.row(index)?;
        let (backend, _) = state.backends.get(&row.backend)?;
        Some((Arc::clone(backend), row.station.clone()))
    }
}

impl<K: SearchKind> EventListener<ManagerEvent> for SearchModel<K> {
    fn on_event(&self, event: &ManagerEvent) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if state.manager.is_none() {
                return;
            }
            match event {
                ManagerEvent::BackendAdded(backend) => {
                    self.observe(&mut state, Arc::clone(backend));
                }
                ManagerEvent::BackendRemoved(identifier) => {
                    if let Some((backend, subscription)) = state.backends.remove(identifier) {
                        backend.unsubscribe(subscription);
                    }
                    state.rows.abandon_backend(identifier, &mut events);
                }
            }
        }
        self.events.emit_all(events);
    }
}

impl<K: SearchKind> EventListener<BackendEvent> for SearchModel<K> {
    fn on_event(&self, event: &BackendEvent) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            let handled = state.rows.apply_backend_event(event, &mut events);
            if let (false, Some((request, rows))) = (handled, K::rows_from(event)) {
                if state.rows.is_tracking(event.backend(), request) {
                    state.rows.append(rows, &mut events);
                    state.rows.untrack(request, &mut events);
                } else {
                    debug!(
                        backend = %event.backend(),
                        request = %request,
                        "ignoring reply for a request this model does not track"
                    );
                }
            }
        }
        self.events.emit_all(events);
    }
}

impl<K: SearchKind> fmt::Debug for SearchModel<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SearchModel")
            .field("rows", &state.rows.count())
            .field("pending", &state.rows.pending_count())
            .field("short", &state.short)
            .field("backends", &state.backends.len())
            .finish_non_exhaustive()
    }
}
