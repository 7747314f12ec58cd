//! In-memory adapters.

mod provider;
mod transport;

pub use provider::StaticProvider;
pub use transport::InMemoryTransport;
