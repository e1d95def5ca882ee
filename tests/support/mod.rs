//! Shared helpers for integration tests: mock server startup and catalog documents.

pub mod fixtures;
pub mod socket_guard;
