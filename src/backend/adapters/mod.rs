//! Adapter implementations of backend wrappers and ports.
//!
//! - [`process`]: wrapper supervising a provider child process
//! - [`plugin`]: wrapper hosting a provider in-process
//! - [`memory`]: in-memory transport and a static provider for tests and
//!   local development

pub mod memory;
pub mod plugin;
pub mod process;

pub use memory::{InMemoryTransport, StaticProvider};
pub use plugin::PluginBackend;
pub use process::{LaunchCommand, LauncherConfig, LauncherConfigError, ProcessBackend};
