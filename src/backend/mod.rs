//! Backend lifecycle and request correlation.
//!
//! A backend is one provider answering public-transport queries. Each one
//! is driven through a [`BackendWrapper`], which tracks its status, the
//! capabilities it advertised at registration, and every request still
//! awaiting a reply. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Shared wrapper state in [`BackendCore`]

pub mod adapters;
pub mod domain;
pub mod ports;
mod shared;
mod wrapper;

pub use shared::{
    BackendCore, REGISTERED_TWICE, REGISTERED_WHILE_NOT_LAUNCHING, RegistrationOutcome,
};
pub use wrapper::BackendWrapper;

#[cfg(test)]
mod tests;
