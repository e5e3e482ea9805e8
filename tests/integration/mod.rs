//! Integration test modules

pub mod loader_tests;
pub mod resolve_tests;
