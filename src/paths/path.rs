use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::error::NameRefError;

/// A parsed slash-delimited field path such as `spec/template/spec/volumes/secret/secretName`.
///
/// Each segment is a mapping key. A literal `/` inside a key is written `\/`
/// (`metadata/annotations/example.com\/ref`). Sequences met along the way are traversed
/// element-wise by the selector, so paths never carry indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    source: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Build a path from a known-good, escape-free literal.
    pub(crate) fn from_static(path: &str) -> FieldPath {
        FieldPath {
            source: path.to_string(),
            segments: path.split('/').map(str::to_string).collect(),
        }
    }

    fn invalid(path: &str, reason: &str) -> NameRefError {
        NameRefError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = NameRefError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Err(FieldPath::invalid(path, "path is empty"));
        }
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped @ ('/' | '\\')) => current.push(escaped),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => return Err(FieldPath::invalid(path, "dangling escape at end of path")),
                },
                '/' => {
                    if current.is_empty() {
                        return Err(FieldPath::invalid(path, "path contains an empty segment"));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }
        if current.is_empty() {
            return Err(FieldPath::invalid(path, "path contains an empty segment"));
        }
        segments.push(current);
        Ok(FieldPath {
            source: path.to_string(),
            segments,
        })
    }
}

impl TryFrom<String> for FieldPath {
    type Error = NameRefError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        FieldPath::from_str(&path)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> String {
        path.source
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
