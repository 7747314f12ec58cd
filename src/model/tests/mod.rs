//! Unit tests for the row models.

mod rows_tests;
mod search_tests;
