//! Transit hub: lifecycle and request correlation for public-transport
//! query backends.
//!
//! A backend is an external provider of real-time transport data, run
//! either as a supervised child process or as an in-process plugin. This
//! crate starts and stops backends, tracks the requests sent to them, and
//! turns their asynchronous replies into row models a UI can bind to.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: entities, identifiers, statuses and events with no
//!   infrastructure dependencies
//! - **Ports**: the provider contract and the transport used to reach
//!   subprocess backends
//! - **Adapters**: subprocess and in-process wrappers, an in-memory
//!   transport and a static provider
//!
//! # Modules
//!
//! - [`entity`]: stations, lines, rides, companies and ride trees
//! - [`backend`]: backend wrappers, their status machine and request table
//! - [`manager`]: the registry of backends keyed by identifier
//! - [`model`]: fan-out and single-backend row models
//! - [`events`]: the observer hub every component publishes through

pub mod backend;
pub mod entity;
pub mod events;
pub mod manager;
pub mod model;

#[cfg(test)]
mod test_support;
