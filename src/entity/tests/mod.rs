//! Unit tests for the transportation entity model.

mod node_tests;
