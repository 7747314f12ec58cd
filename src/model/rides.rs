//! Departures from one station, queried on a single backend.

use super::error::MalformedRidesError;
use super::rows::{ModelEvent, RowModel};
use crate::backend::BackendWrapper;
use crate::backend::domain::{BackendEvent, Capability, RequestId, RequestPayload};
use crate::entity::{CompanyNode, Station};
use crate::events::{EventHub, EventListener, SubscriptionId};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

/// One departing ride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideRow {
    /// Name of the line the ride belongs to.
    pub line: String,
    /// Name of the ride.
    pub name: String,
}

/// Sorts a rides reply and flattens it to one row per ride.
///
/// Every level is ordered by name with ties kept in reply order. A ride
/// node that does not carry exactly one station rejects the whole reply.
///
/// # Errors
///
/// Returns [`MalformedRidesError::UnexpectedStationCount`] for the first
/// ride node with zero or several stations.
pub fn flatten_rides(companies: Vec<CompanyNode>) -> Result<Vec<RideRow>, MalformedRidesError> {
    let mut sorted: Vec<CompanyNode> = companies.into_iter().map(CompanyNode::sorted).collect();
    sorted.sort_by(|left, right| left.company().compare_by_name(right.company()));

    let mut rows = Vec::new();
    for company in &sorted {
        for line in company.lines() {
            for ride in line.rides() {
                let count = ride.stations().len();
                if count != 1 {
                    return Err(MalformedRidesError::UnexpectedStationCount {
                        ride: ride.ride().identifier().to_owned(),
                        count,
                    });
                }
                rows.push(RideRow {
                    line: line.line().name().to_owned(),
                    name: ride.ride().name().to_owned(),
                });
            }
        }
    }
    Ok(rows)
}

struct Target {
    backend: Arc<dyn BackendWrapper>,
    subscription: SubscriptionId,
}

struct RidesState {
    rows: RowModel<RideRow>,
    station: Option<Station>,
    target: Option<Target>,
}

/// Shows the rides departing from the station the user selected.
///
/// Only the latest query is current: issuing a new one drops the rows and
/// the pending request of the previous one, and replies to it are ignored.
pub struct RidesFromStationModel {
    state: Mutex<RidesState>,
    events: EventHub<ModelEvent>,
    self_ref: Weak<Self>,
}

impl RidesFromStationModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(RidesState {
                rows: RowModel::new(),
                station: None,
                target: None,
            }),
            events: EventHub::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// Asks `backend` for the rides departing from `station`.
    ///
    /// Returns `None` without sending anything when the backend does not
    /// advertise [`Capability::RidesFromStation`]; the previous results are
    /// cleared either way.
    pub fn request_rides(
        &self,
        backend: Arc<dyn BackendWrapper>,
        station: Station,
    ) -> Option<RequestId> {
        let mut events = Vec::new();
        let (current, outbound) = {
            let mut state = self.lock();
            state.rows.clear(&mut events);
            state.station = Some(station.clone());
            let target = self.retarget(&mut state, backend);

            let outbound = if target.capabilities().contains(Capability::RidesFromStation) {
                let request = target.prepare_request(RequestPayload::RidesFromStation { station });
                state
                    .rows
                    .track(request.request_id(), target.identifier().clone(), &mut events);
                Some(request)
            } else {
                warn!(
                    backend = %target.identifier(),
                    "backend does not provide rides from station"
                );
                None
            };
            (target, outbound)
        };

        self.events.emit_all(events);
        let request = outbound?;
        let request_id = request.request_id();
        current.forward(request);
        Some(request_id)
    }

    /// Returns the station of the current query.
    #[must_use]
    pub fn station(&self) -> Option<Station> {
        self.lock().station.clone()
    }

    /// Returns the backend of the current query.
    #[must_use]
    pub fn backend(&self) -> Option<Arc<dyn BackendWrapper>> {
        self.lock()
            .target
            .as_ref()
            .map(|target| Arc::clone(&target.backend))
    }

    /// Drops every row and stops waiting for the reply.
    pub fn clear(&self) {
        let mut events = Vec::new();
        self.lock().rows.clear(&mut events);
        self.events.emit_all(events);
    }

    /// Returns whether the reply is still outstanding.
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
    pub fn rows(&self) -> Vec<RideRow> {
        self.lock().rows.rows().to_vec()
    }

    /// Returns a copy of the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<RideRow> {
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

    /// Makes `backend` the observed backend and returns it.
    fn retarget(
        &self,
        state: &mut RidesState,
        backend: Arc<dyn BackendWrapper>,
    ) -> Arc<dyn BackendWrapper> {
        match state.target.take() {
            Some(target) if Arc::ptr_eq(&target.backend, &backend) => {
                state.target = Some(target);
            }
            previous => {
                if let Some(stale) = previous {
                    stale.backend.unsubscribe(stale.subscription);
                }
                let listener: Weak<dyn EventListener<BackendEvent>> = self.self_ref.clone();
                let subscription = backend.subscribe(listener);
                state.target = Some(Target {
                    backend: Arc::clone(&backend),
                    subscription,
                });
            }
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, RidesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventListener<BackendEvent> for RidesFromStationModel {
    fn on_event(&self, event: &BackendEvent) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            let handled = state.rows.apply_backend_event(event, &mut events);
            if let (
                false,
                BackendEvent::RidesFromStationRegistered {
                    backend,
                    request,
                    companies,
                },
            ) = (handled, event)
            {
                if !state.rows.is_tracking(backend, *request) {
                    debug!(
                        backend = %backend,
                        request = %request,
                        "ignoring rides for a superseded request"
                    );
                    return;
                }
                match flatten_rides(companies.clone()) {
                    Ok(rows) => {
                        debug!(
                            backend = %backend,
                            request = %request,
                            rows = rows.len(),
                            "rides received"
                        );
                        state.rows.append(rows, &mut events);
                    }
                    Err(err) => {
                        warn!(
                            backend = %backend,
                            request = %request,
                            error = %err,
                            "discarding malformed rides reply"
                        );
                    }
                }
                state.rows.untrack(*request, &mut events);
            }
        }
        self.events.emit_all(events);
    }
}

impl fmt::Debug for RidesFromStationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("RidesFromStationModel")
            .field("station", &state.station)
            .field("rows", &state.rows.count())
            .field("loading", &state.rows.is_loading())
            .finish_non_exhaustive()
    }
}
