//! Unit tests for the backend manager.
