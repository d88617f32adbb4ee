//! Shared harness for the integration test suites.

pub mod fixtures;
pub mod mocks;
pub mod setup;
