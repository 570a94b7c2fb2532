//! Parsed resource documents.
//!
//! A [`Resource`] wraps an already-parsed document tree and exposes the identity fields
//! (`apiVersion`, `kind`, `metadata.name`, `metadata.namespace`) plus the rename history
//! annotations that earlier pipeline stages leave behind.

use serde::Deserialize;
use serde_yaml::Value;
use std::str::FromStr;

use crate::{
    error::NameRefError,
    resid::{Gvk, ResId},
};

/// Comma separated names this resource carried before it was renamed, oldest first.
pub const PREVIOUS_NAMES_ANNOTATION: &str = "internal.config.kubernetes.io/previousNames";
/// Comma separated namespaces this resource carried before it was renamed, oldest first.
pub const PREVIOUS_NAMESPACES_ANNOTATION: &str =
    "internal.config.kubernetes.io/previousNamespaces";

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    node: Value,
}

impl Resource {
    pub fn new(node: Value) -> Resource {
        Resource { node }
    }

    /// Parse every document of a YAML stream. Empty documents are skipped.
    pub fn from_yaml_stream(text: &str) -> Result<Vec<Resource>, NameRefError> {
        let mut resources = Vec::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            let node = Value::deserialize(document)?;
            if node.is_null() {
                continue;
            }
            resources.push(Resource::new(node));
        }
        tracing::trace!(
            "[Resource::from_yaml_stream] parsed {} documents",
            resources.len()
        );
        Ok(resources)
    }

    pub fn from_json_str(text: &str) -> Result<Resource, NameRefError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Resource::new(serde_yaml::to_value(json)?))
    }

    pub fn node(&self) -> &Value {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Value {
        &mut self.node
    }

    pub fn into_node(self) -> Value {
        self.node
    }

    pub fn to_yaml_string(&self) -> Result<String, NameRefError> {
        Ok(serde_yaml::to_string(&self.node)?)
    }

    pub fn gvk(&self) -> Gvk {
        Gvk::from_api_version(
            self.str_field(&["apiVersion"]).unwrap_or_default(),
            self.str_field(&["kind"]).unwrap_or_default(),
        )
    }

    pub fn name(&self) -> &str {
        self.str_field(&["metadata", "name"]).unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.str_field(&["metadata", "namespace"]).unwrap_or_default()
    }

    pub fn id(&self) -> ResId {
        ResId::new(self.gvk(), self.name(), self.namespace())
    }

    /// How this resource is named in diagnostics: its id, or an empty string when the
    /// document carries no `metadata.name`.
    pub fn label(&self) -> String {
        if self.name().is_empty() {
            String::new()
        } else {
            self.id().to_string()
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.str_field(&["metadata", "annotations", key])
    }

    pub fn previous_names(&self) -> Vec<&str> {
        split_history(self.annotation(PREVIOUS_NAMES_ANNOTATION))
    }

    pub fn previous_namespaces(&self) -> Vec<&str> {
        split_history(self.annotation(PREVIOUS_NAMESPACES_ANNOTATION))
    }

    /// Name before any rename recorded in the annotations, falling back to the current name.
    pub fn original_name(&self) -> &str {
        self.previous_names()
            .first()
            .copied()
            .unwrap_or_else(|| self.name())
    }

    pub fn original_namespace(&self) -> &str {
        self.previous_namespaces()
            .first()
            .copied()
            .unwrap_or_else(|| self.namespace())
    }

    fn str_field(&self, keys: &[&str]) -> Option<&str> {
        let mut node = &self.node;
        for key in keys {
            node = node.get(*key)?;
        }
        node.as_str()
    }
}

impl FromStr for Resource {
    type Err = NameRefError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let node: Value = serde_yaml::from_str(text)?;
        Ok(Resource::new(node))
    }
}

impl From<Value> for Resource {
    fn from(node: Value) -> Self {
        Resource::new(node)
    }
}

fn split_history(annotation: Option<&str>) -> Vec<&str> {
    match annotation.map(str::trim) {
        Some(value) if !value.is_empty() => value.split(',').map(str::trim).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: dep
  namespace: prod
"#;

    #[test]
    fn test_identity_fields() {
        let res = Resource::from_str(DEPLOYMENT).unwrap();
        assert_eq!(res.gvk(), Gvk::new("apps", "v1", "Deployment"));
        assert_eq!(res.name(), "dep");
        assert_eq!(res.namespace(), "prod");
        assert_eq!(res.label(), "Deployment.v1.apps/dep.prod");
    }

    #[test]
    fn test_label_is_empty_without_name() {
        let res = Resource::from_str("kind: Deployment\nref:\n  name: x\n").unwrap();
        assert_eq!(res.label(), "");
    }

    #[test]
    fn test_stream_skips_empty_documents() {
        let stream = format!("---\n{DEPLOYMENT}\n---\n---\nkind: Secret\nmetadata:\n  name: s\n");
        let resources = Resource::from_yaml_stream(&stream).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[1].name(), "s");
    }

    #[test]
    fn test_original_identity_from_annotations() {
        let res = Resource::from_str(
            r#"
apiVersion: v1
kind: Secret
metadata:
  name: p-creds-abc123
  namespace: staging
  annotations:
    internal.config.kubernetes.io/previousNames: creds, p-creds
    internal.config.kubernetes.io/previousNamespaces: default,default
"#,
        )
        .unwrap();
        assert_eq!(res.previous_names(), vec!["creds", "p-creds"]);
        assert_eq!(res.original_name(), "creds");
        assert_eq!(res.original_namespace(), "default");

        let plain = Resource::from_str(DEPLOYMENT).unwrap();
        assert_eq!(plain.original_name(), "dep");
        assert_eq!(plain.original_namespace(), "prod");
    }

    #[test]
    fn test_from_json() {
        let res = Resource::from_json_str(
            r#"{"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "cm"}}"#,
        )
        .unwrap();
        assert_eq!(res.id().to_string(), "ConfigMap.v1/cm");
    }
}
