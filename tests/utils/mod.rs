pub mod actions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{MockImageHost, HOSTED_URL};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
