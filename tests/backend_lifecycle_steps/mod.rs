//! Step definitions for backend lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
