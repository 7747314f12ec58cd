//! Row models aggregating asynchronous backend replies for a UI layer.
//!
//! Every model keeps a flat list of rows, the set of requests it is still
//! waiting for, and publishes [`ModelEvent`]s describing each change:
//!
//! - [`StationSearchModel`] and [`LineSearchModel`] fan a query out to every
//!   capable backend and append replies in completion order
//! - [`RidesFromStationModel`] queries a single backend and flattens the
//!   returned ride tree
//! - [`BackendCatalog`] lists known backends with their live status

mod catalog;
mod error;
mod rides;
mod rows;
mod search;

pub use catalog::{BackendCatalog, BackendDescriptor, CatalogRow};
pub use error::MalformedRidesError;
pub use rides::{RideRow, RidesFromStationModel, flatten_rides};
pub use rows::{ModelEvent, RowModel};
pub use search::{
    LineRow, LineSearch, LineSearchModel, MIN_QUERY_LENGTH, SearchKind, SearchModel, StationRow,
    StationSearch, StationSearchModel,
};

#[cfg(test)]
mod tests;
