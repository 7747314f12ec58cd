//! Synchronous observer hub used to publish change notifications.
//!
//! Backend wrappers, the backend manager and the row models each own an
//! [`EventHub`]. Listeners are held weakly so that a subscriber going away
//! never keeps its publisher alive and never has to unsubscribe explicitly.
//! Events are delivered on the emitting thread after the hub's lock has been
//! released, which lets listeners call back into the publisher.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receives events published by an [`EventHub`].
pub trait EventListener<E>: Send + Sync {
    /// Handles one published event.
    fn on_event(&self, event: &E);
}

/// Handle identifying one subscription on an [`EventHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw subscription counter value.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "subscription-{}", self.0)
    }
}

struct HubState<E> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Weak<dyn EventListener<E>>)>,
}

/// Fan-out point for events of type `E`.
pub struct EventHub<E> {
    state: Mutex<HubState<E>>,
}

impl<E> EventHub<E> {
    /// Creates a hub without listeners.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(HubState {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Registers a listener and returns its subscription handle.
    pub fn subscribe(&self, listener: Weak<dyn EventListener<E>>) -> SubscriptionId {
        let mut state = self.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        state.listeners.push((id, listener));
        id
    }

    /// Removes a subscription. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(id, _)| *id != subscription);
        state.listeners.len() != before
    }

    /// Returns the number of listeners that are still alive.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    /// Delivers `event` to every live listener.
    pub fn emit(&self, event: &E) {
        for listener in self.snapshot() {
            listener.on_event(event);
        }
    }

    /// Delivers a batch of events in order.
    pub fn emit_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = E>,
    {
        let mut pending = events.into_iter().peekable();
        if pending.peek().is_none() {
            return;
        }
        let listeners = self.snapshot();
        for event in pending {
            for listener in &listeners {
                listener.on_event(&event);
            }
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn EventListener<E>>> {
        let mut state = self.lock();
        state
            .listeners
            .retain(|(_, listener)| listener.strong_count() > 0);
        state
            .listeners
            .iter()
            .filter_map(|(_, listener)| listener.upgrade())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HubState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventHub<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EventHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Listener that records every event it receives. Intended for tests and
/// diagnostics.
#[derive(Debug)]
pub struct RecordingListener<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone + Send> RecordingListener<E> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<E> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns the recorded events.
    pub fn take(&self) -> Vec<E> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<E: Clone + Send> EventListener<E> for RecordingListener<E> {
    fn on_event(&self, event: &E) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
