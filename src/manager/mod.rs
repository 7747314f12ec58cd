//! Backend manager: the registry of backend wrappers keyed by identifier.
//!
//! The manager owns every wrapper, creates new ones through a
//! [`BackendFactory`], and announces additions and removals as
//! [`ManagerEvent`]s so that models can follow the set of backends.

mod factory;
mod service;

pub use factory::{BackendFactory, PluginBackendFactory, ProcessBackendFactory};
pub use service::{BackendManager, ManagerEvent};

#[cfg(test)]
mod tests;
