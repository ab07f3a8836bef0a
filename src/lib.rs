//! Conformance test runner for GraphQL endpoints
//!
//! Loads test cases, replays their prepare, test and cleanup queries
//! against an HTTP endpoint, and compares each response with the expected
//! output.

pub mod cases;
pub mod cli;
pub mod commands;
pub mod common;
pub mod compare;
pub mod http;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
