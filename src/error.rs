use std::io;

use serde_json::Error as JsonError;
use serde_yaml::Error as YamlError;
use thiserror::Error;

/// Errors raised while loading resources or resolving name references.
///
/// The resolution variants always carry the referrer label and the field path
/// that failed, so the message can be surfaced verbatim by whatever pipeline
/// stage invoked the filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRefError {
    #[error("obj '{referrer}' at path '{path}': node is expected to be either a string or a slice of string or a map of string")]
    Shape { referrer: String, path: String },
    #[error("obj '{referrer}' at path '{path}': node is expected to contain a name field")]
    MissingNameField { referrer: String, path: String },
    #[error("obj '{referrer}' at path '{path}': found multiple possible referrals for '{value}': {}", .candidates.join(", "))]
    AmbiguousReference {
        referrer: String,
        path: String,
        value: String,
        candidates: Vec<String>,
    },
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("File System error: {0}")]
    Io(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl NameRefError {
    /// The field path this error is attributed to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            NameRefError::Shape { path, .. }
            | NameRefError::MissingNameField { path, .. }
            | NameRefError::AmbiguousReference { path, .. }
            | NameRefError::InvalidPath { path, .. } => Some(path),
            NameRefError::Io(_) | NameRefError::Serialization(_) => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, NameRefError::AmbiguousReference { .. })
    }
}

impl From<io::Error> for NameRefError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => NameRefError::Io(format!("Not found: {x}")),
            _ => NameRefError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<YamlError> for NameRefError {
    fn from(src: YamlError) -> NameRefError {
        NameRefError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<JsonError> for NameRefError {
    fn from(src: JsonError) -> NameRefError {
        NameRefError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<toml::de::Error> for NameRefError {
    fn from(src: toml::de::Error) -> NameRefError {
        NameRefError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for NameRefError {
    fn from(src: toml::ser::Error) -> NameRefError {
        NameRefError::Serialization(format!("Toml serialization error: {src}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_message() {
        let err = NameRefError::Shape {
            referrer: String::new(),
            path: "ref/name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "obj '' at path 'ref/name': node is expected to be either a string or a slice of string or a map of string"
        );
        assert_eq!(err.path(), Some("ref/name"));
    }

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = NameRefError::AmbiguousReference {
            referrer: "Deployment.v1.apps/dep".to_string(),
            path: "ref/name".to_string(),
            value: "oldName".to_string(),
            candidates: vec![
                "Secret.v1.apps/newName".to_string(),
                "Secret.v1.apps/newName2".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "obj 'Deployment.v1.apps/dep' at path 'ref/name': found multiple possible referrals for 'oldName': Secret.v1.apps/newName, Secret.v1.apps/newName2"
        );
        assert!(err.is_ambiguous());
    }
}
