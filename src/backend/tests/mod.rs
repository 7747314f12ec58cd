//! Unit tests for backend domain types, the shared core and wrappers.
