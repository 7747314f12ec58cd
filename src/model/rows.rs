//! Shared row storage and request tracking for models.

use crate::backend::domain::{BackendEvent, BackendIdentifier, BackendStatus, ErrorKind, RequestId};
use std::collections::HashMap;
use tracing::debug;

/// Change published by a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Rows `first..=last` were appended.
    RowsInserted {
        /// Index of the first new row.
        first: usize,
        /// Index of the last new row.
        last: usize,
    },
    /// Rows `first..=last` were removed.
    RowsRemoved {
        /// Index of the first removed row.
        first: usize,
        /// Index of the last removed row.
        last: usize,
    },
    /// The row at the index changed in place.
    RowChanged(usize),
    /// The number of rows changed.
    CountChanged(usize),
    /// The model started or stopped waiting for replies.
    LoadingChanged(bool),
    /// The query became too short to search, or long enough again.
    ShortChanged(bool),
    /// A backend resolved a tracked request with a user-visible error.
    ErrorReported {
        /// Backend reporting the error.
        backend: BackendIdentifier,
        /// Request the error resolved.
        request: RequestId,
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
}

/// Rows plus the requests a model is waiting for.
///
/// Mutating methods append the resulting [`ModelEvent`]s to a caller-owned
/// buffer so that the owning model can publish them after releasing its
/// lock. `LoadingChanged` is produced only when the pending set switches
/// between empty and non-empty.
#[derive(Debug, Clone)]
pub struct RowModel<R> {
    rows: Vec<R>,
    pending: HashMap<RequestId, BackendIdentifier>,
}

impl<R> RowModel<R> {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            pending: HashMap::new(),
        }
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Returns the row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether any request is pending.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the number of pending requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether `request` is tracked as issued to `backend`.
    #[must_use]
    pub fn is_tracking(&self, backend: &BackendIdentifier, request: RequestId) -> bool {
        self.pending.get(&request) == Some(backend)
    }

    /// Starts waiting for `request` issued to `backend`.
    pub fn track(
        &mut self,
        request: RequestId,
        backend: BackendIdentifier,
        events: &mut Vec<ModelEvent>,
    ) {
        let was_loading = self.is_loading();
        self.pending.insert(request, backend);
        if !was_loading {
            events.push(ModelEvent::LoadingChanged(true));
        }
    }

    /// Stops waiting for `request`. Returns the backend it was issued to.
    pub fn untrack(
        &mut self,
        request: RequestId,
        events: &mut Vec<ModelEvent>,
    ) -> Option<BackendIdentifier> {
        let backend = self.pending.remove(&request)?;
        if self.pending.is_empty() {
            events.push(ModelEvent::LoadingChanged(false));
        }
        Some(backend)
    }

    /// Stops waiting for every request issued to `backend`.
    pub fn abandon_backend(
        &mut self,
        backend: &BackendIdentifier,
        events: &mut Vec<ModelEvent>,
    ) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, issued_to| issued_to != backend);
        let abandoned = before - self.pending.len();
        if abandoned > 0 {
            debug!(backend = %backend, abandoned, "model abandoned pending requests");
            if self.pending.is_empty() {
                events.push(ModelEvent::LoadingChanged(false));
            }
        }
        abandoned
    }

    /// Appends rows.
    pub fn append(&mut self, rows: Vec<R>, events: &mut Vec<ModelEvent>) {
        if rows.is_empty() {
            return;
        }
        let first = self.rows.len();
        self.rows.extend(rows);
        events.push(ModelEvent::RowsInserted {
            first,
            last: self.rows.len() - 1,
        });
        events.push(ModelEvent::CountChanged(self.rows.len()));
    }

    /// Removes every row and forgets every pending request.
    pub fn clear(&mut self, events: &mut Vec<ModelEvent>) {
        if !self.pending.is_empty() {
            self.pending.clear();
            events.push(ModelEvent::LoadingChanged(false));
        }
        if !self.rows.is_empty() {
            let last = self.rows.len() - 1;
            self.rows.clear();
            events.push(ModelEvent::RowsRemoved { first: 0, last });
            events.push(ModelEvent::CountChanged(0));
        }
    }

    /// Applies the backend events every model reacts to in the same way.
    ///
    /// A backend leaving `Launched` abandons its requests. An error for a
    /// tracked request resolves it and, for user-visible kinds, is reported
    /// as [`ModelEvent::ErrorReported`]. Returns whether the event was
    /// handled here.
    pub fn apply_backend_event(&mut self, event: &BackendEvent, events: &mut Vec<ModelEvent>) -> bool {
        match event {
            BackendEvent::StatusChanged { backend, status } => {
                if *status != BackendStatus::Launched {
                    self.abandon_backend(backend, events);
                }
                true
            }
            BackendEvent::ErrorRegistered {
                backend,
                request,
                kind,
                message,
            } => {
                if self.is_tracking(backend, *request) {
                    self.untrack(*request, events);
                    if kind.is_user_visible() {
                        events.push(ModelEvent::ErrorReported {
                            backend: backend.clone(),
                            request: *request,
                            kind: *kind,
                            message: message.clone(),
                        });
                    }
                }
                true
            }
            BackendEvent::CapabilitiesChanged { .. } | BackendEvent::CopyrightChanged { .. } => true,
            BackendEvent::SuggestedStationsRegistered { .. }
            | BackendEvent::SuggestedLinesRegistered { .. }
            | BackendEvent::RidesFromStationRegistered { .. } => false,
        }
    }
}

impl<R> Default for RowModel<R> {
    fn default() -> Self {
        Self::new()
    }
}
