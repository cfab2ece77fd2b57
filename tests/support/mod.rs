//! Shared helpers for integration tests.

pub mod catalog_fixtures;
pub mod socket_guard;
