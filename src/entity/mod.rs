//! Transportation entity model shared by backends, the manager and models.
//!
//! Entities ([`Station`], [`Line`], [`Ride`], [`Company`]) are plain values
//! identified by a provider-qualified identifier. Ride results arrive as a
//! strict tree of [`CompanyNode`] → [`LineNode`] → [`RideNode`] values that
//! is rebuilt for every response.
//!
//! Entities travel across process boundaries as the ordered tuple
//! `(identifier, internal, name, properties)`; nodes travel as
//! `(head, [children])`.

mod error;
mod node;
mod object;

pub use error::EntityDomainError;
pub use node::{CompanyNode, LineNode, RideNode};
pub use object::{
    AttributeMap, Company, CompanyKind, EntityKind, Line, LineKind, Ride, RideKind, Station,
    StationKind, TransportEntity, sort_by_name,
};

#[cfg(test)]
mod tests;
