//! Step definitions for station search scenarios.

mod given;
mod then;
mod when;
pub mod world;
