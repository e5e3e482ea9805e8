//! Common test utilities and helpers

pub mod test_app;

pub use test_app::*;
