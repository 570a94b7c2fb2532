//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use nameref::{candidates::CandidateRegistry, resource::Resource};
use std::str::FromStr;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Parse a single referrer document.
#[allow(dead_code)]
pub fn parse(text: &str) -> Resource {
    Resource::from_str(text).unwrap()
}

/// Parse a candidate stream, pairing documents with their original names in order.
#[allow(dead_code)]
pub fn candidates(text: &str, original_names: &[&str]) -> CandidateRegistry {
    CandidateRegistry::from_yaml_with_original_names(text, original_names).unwrap()
}

/// Serialize a resource and trim surrounding whitespace for comparison with fixtures.
#[allow(dead_code)]
pub fn render(resource: &Resource) -> String {
    resource.to_yaml_string().unwrap().trim().to_string()
}
