//! Shared test utilities for name reference resolution

use crate::{
    candidates::{Candidate, CandidateRegistry},
    filter::{FieldSpec, NameRefFilter},
    resid::Gvk,
    resource::Resource,
};
use std::str::FromStr;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn secret_gvk() -> Gvk {
    Gvk::new("apps", "v1", "Secret")
}

/// A Deployment named `dep` carrying `body` as extra top-level fields.
pub fn referrer(body: &str) -> Resource {
    init_logging();
    Resource::from_str(&format!(
        "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: dep\n{body}"
    ))
    .unwrap()
}

/// A secret candidate renamed from `original` to `current`.
pub fn renamed_secret(original: &str, current: &str) -> Candidate {
    Candidate::new(secret_gvk(), current, "").with_original_name(original)
}

pub fn registry(candidates: Vec<Candidate>) -> CandidateRegistry {
    CandidateRegistry::new(candidates)
}

pub fn secret_filter(path: &str) -> NameRefFilter {
    NameRefFilter::new(FieldSpec::new(path).unwrap(), secret_gvk())
}

pub fn yaml(resource: &Resource) -> serde_yaml::Value {
    resource.node().clone()
}
