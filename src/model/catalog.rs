//! Catalog of installable backends with their live status.

use super::rows::ModelEvent;
use crate::backend::BackendWrapper;
use crate::backend::domain::{BackendDomainError, BackendEvent, BackendIdentifier, BackendStatus};
use crate::events::{EventHub, EventListener, SubscriptionId};
use crate::manager::{BackendManager, ManagerEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};

/// Static description of a backend that can be started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    identifier: BackendIdentifier,
    name: String,
    #[serde(default)]
    description: String,
    executable: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    arguments: BTreeMap<String, String>,
}

impl BackendDescriptor {
    /// Creates a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`BackendDomainError::EmptyExecutable`] when `executable` is
    /// blank.
    pub fn new(
        identifier: BackendIdentifier,
        name: impl Into<String>,
        executable: impl Into<String>,
    ) -> Result<Self, BackendDomainError> {
        let command = executable.into().trim().to_owned();
        if command.is_empty() {
            return Err(BackendDomainError::EmptyExecutable(identifier.to_string()));
        }
        Ok(Self {
            identifier,
            name: name.into(),
            description: String::new(),
            executable: command,
            country: None,
            arguments: BTreeMap::new(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the country the backend covers.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Adds a launch argument.
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Returns the backend identifier.
    #[must_use]
    pub const fn identifier(&self) -> &BackendIdentifier {
        &self.identifier
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the executable string passed to the manager.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Returns the covered country.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Returns the launch arguments.
    #[must_use]
    pub const fn arguments(&self) -> &BTreeMap<String, String> {
        &self.arguments
    }

    fn matches_country(&self, filter: Option<&str>) -> bool {
        filter.is_none_or(|wanted| {
            self.country
                .as_deref()
                .is_some_and(|country| country.eq_ignore_ascii_case(wanted))
        })
    }
}

/// A visible catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    /// Static description.
    pub descriptor: BackendDescriptor,
    /// Status of the managed backend, `Stopped` when it was never added.
    pub status: BackendStatus,
}

struct CatalogState {
    descriptors: Vec<BackendDescriptor>,
    visible: Vec<usize>,
    country: Option<String>,
    observed: HashMap<BackendIdentifier, (Arc<dyn BackendWrapper>, SubscriptionId)>,
}

impl CatalogState {
    fn visible_index(&self, identifier: &BackendIdentifier) -> Option<usize> {
        self.visible.iter().position(|index| {
            self.descriptors
                .get(*index)
                .is_some_and(|descriptor| descriptor.identifier() == identifier)
        })
    }

    fn refilter(&mut self, events: &mut Vec<ModelEvent>) {
        if let Some(last) = self.visible.len().checked_sub(1) {
            self.visible.clear();
            events.push(ModelEvent::RowsRemoved { first: 0, last });
        }
        let country = self.country.as_deref();
        self.visible = self
            .descriptors
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| descriptor.matches_country(country))
            .map(|(index, _)| index)
            .collect();
        if let Some(last) = self.visible.len().checked_sub(1) {
            events.push(ModelEvent::RowsInserted { first: 0, last });
        }
        events.push(ModelEvent::CountChanged(self.visible.len()));
    }
}

/// Lists known backends, filtered by country, with the status the manager
/// reports for each of them.
pub struct BackendCatalog {
    manager: Arc<BackendManager>,
    subscription: SubscriptionId,
    state: Mutex<CatalogState>,
    events: EventHub<ModelEvent>,
    self_ref: Weak<Self>,
}

impl BackendCatalog {
    /// Creates an empty catalog observing `manager`.
    #[must_use]
    pub fn new(manager: Arc<BackendManager>) -> Arc<Self> {
        let catalog = Arc::new_cyclic(|self_ref: &Weak<Self>| {
            let listener: Weak<dyn EventListener<ManagerEvent>> = self_ref.clone();
            let subscription = manager.subscribe(listener);
            Self {
                manager,
                subscription,
                state: Mutex::new(CatalogState {
                    descriptors: Vec::new(),
                    visible: Vec::new(),
                    country: None,
                    observed: HashMap::new(),
                }),
                events: EventHub::new(),
                self_ref: self_ref.clone(),
            }
        });
        {
            let mut state = catalog.lock();
            for backend in catalog.manager.backends() {
                catalog.observe(&mut state, backend);
            }
        }
        catalog
    }

    /// Returns the observed manager.
    #[must_use]
    pub const fn manager(&self) -> &Arc<BackendManager> {
        &self.manager
    }

    /// Replaces the known descriptors. Later duplicates of an identifier
    /// are dropped.
    pub fn set_descriptors(&self, descriptors: Vec<BackendDescriptor>) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            let mut seen = BTreeSet::new();
            state.descriptors = descriptors
                .into_iter()
                .filter(|descriptor| seen.insert(descriptor.identifier().clone()))
                .collect();
            state.refilter(&mut events);
            debug!(
                descriptors = state.descriptors.len(),
                visible = state.visible.len(),
                "backend catalog reloaded"
            );
        }
        self.events.emit_all(events);
    }

    /// Returns the descriptor for `identifier`, visible or not.
    #[must_use]
    pub fn descriptor(&self, identifier: &BackendIdentifier) -> Option<BackendDescriptor> {
        self.lock()
            .descriptors
            .iter()
            .find(|descriptor| descriptor.identifier() == identifier)
            .cloned()
    }

    /// Restricts the visible rows to one country. `None` or blank text
    /// shows every backend.
    pub fn set_country_filter(&self, country: Option<&str>) {
        let normalized = country
            .map(str::trim)
            .filter(|country| !country.is_empty())
            .map(str::to_owned);
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            if state.country == normalized {
                return;
            }
            state.country = normalized;
            state.refilter(&mut events);
        }
        self.events.emit_all(events);
    }

    /// Returns the active country filter.
    #[must_use]
    pub fn country_filter(&self) -> Option<String> {
        self.lock().country.clone()
    }

    /// Returns every country named by a descriptor, sorted and deduplicated.
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        self.lock()
            .descriptors
            .iter()
            .filter_map(BackendDescriptor::country)
            .map(str::to_owned)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the number of visible rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().visible.len()
    }

    /// Returns every visible row.
    #[must_use]
    pub fn rows(&self) -> Vec<CatalogRow> {
        let descriptors: Vec<BackendDescriptor> = {
            let state = self.lock();
            state
                .visible
                .iter()
                .filter_map(|index| state.descriptors.get(*index).cloned())
                .collect()
        };
        descriptors
            .into_iter()
            .map(|descriptor| self.to_row(descriptor))
            .collect()
    }

    /// Returns the visible row at `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<CatalogRow> {
        let descriptor = {
            let state = self.lock();
            let position = *state.visible.get(index)?;
            state.descriptors.get(position)?.clone()
        };
        Some(self.to_row(descriptor))
    }

    /// Returns the status of the backend with `identifier`.
    #[must_use]
    pub fn status(&self, identifier: &BackendIdentifier) -> BackendStatus {
        self.manager
            .backend(identifier)
            .map_or(BackendStatus::Stopped, |backend| backend.status())
    }

    /// Starts a catalogued backend, adding it to the manager first when
    /// needed. A backend that is not `Stopped` is killed and relaunched.
    /// Returns `false` when no descriptor has `identifier`.
    pub async fn start_backend(&self, identifier: &BackendIdentifier) -> bool {
        let Some(descriptor) = self.descriptor(identifier) else {
            debug!(backend = %identifier, "cannot start uncatalogued backend");
            return false;
        };
        let backend = self.manager.add_backend(
            identifier.clone(),
            descriptor.executable(),
            descriptor.arguments().clone(),
        );
        if backend.status() != BackendStatus::Stopped {
            info!(backend = %identifier, "restarting backend");
            backend.kill().await;
        }
        backend.launch().await;
        true
    }

    /// Stops a managed backend. Returns `false` when the manager does not
    /// know it.
    pub async fn stop_backend(&self, identifier: &BackendIdentifier) -> bool {
        self.manager.stop_backend(identifier).await
    }

    /// Subscribes a listener to catalog changes.
    pub fn subscribe(&self, listener: Weak<dyn EventListener<ModelEvent>>) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Cancels a subscription.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        self.events.unsubscribe(subscription)
    }

    fn to_row(&self, descriptor: BackendDescriptor) -> CatalogRow {
        let status = self.status(descriptor.identifier());
        CatalogRow { descriptor, status }
    }

    fn observe(&self, state: &mut CatalogState, backend: Arc<dyn BackendWrapper>) {
        if state.observed.contains_key(backend.identifier()) {
            return;
        }
        let listener: Weak<dyn EventListener<BackendEvent>> = self.self_ref.clone();
        let subscription = backend.subscribe(listener);
        state
            .observed
            .insert(backend.identifier().clone(), (backend, subscription));
    }

    fn row_changed(&self, identifier: &BackendIdentifier) -> Option<ModelEvent> {
        self.lock()
            .visible_index(identifier)
            .map(ModelEvent::RowChanged)
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventListener<ManagerEvent> for BackendCatalog {
    fn on_event(&self, event: &ManagerEvent) {
        {
            let mut state = self.lock();
            match event {
                ManagerEvent::BackendAdded(backend) => {
                    self.observe(&mut state, Arc::clone(backend));
                }
                ManagerEvent::BackendRemoved(identifier) => {
                    if let Some((backend, subscription)) = state.observed.remove(identifier) {
                        backend.unsubscribe(subscription);
                    }
                }
            }
        }
        if let Some(changed) = self.row_changed(event.identifier()) {
            self.events.emit(&changed);
        }
    }
}

impl EventListener<BackendEvent> for BackendCatalog {
    fn on_event(&self, event: &BackendEvent) {
        if !matches!(event, BackendEvent::StatusChanged { .. }) {
            return;
        }
        if let Some(changed) = self.row_changed(event.backend()) {
            self.events.emit(&changed);
        }
    }
}

impl Drop for BackendCatalog {
    fn drop(&mut self) {
        self.manager.unsubscribe(self.subscription);
    }
}

impl fmt::Debug for BackendCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BackendCatalog")
            .field("descriptors", &state.descriptors.len())
            .field("visible", &state.visible.len())
            .field("country", &state.country)
            .finish_non_exhaustive()
    }
}
