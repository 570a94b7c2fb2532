//! Locating reference fields inside a document tree.
//!
//! [`select`] walks a [`FieldPath`] through a document and returns every [`Location`] it
//! designates. Shape validation happens here, once, so callers only ever see string values
//! that can be replaced in place.

use serde_yaml::Value;
use std::fmt::{Display, Formatter};

use super::path::FieldPath;
use crate::error::NameRefError;

/// One concrete step from a parent node to a child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// Concrete address of a node: the keys and sequence indices taken from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePointer(Vec<Step>);

impl NodePointer {
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn child(&self, step: Step) -> NodePointer {
        let mut steps = self.0.clone();
        steps.push(step);
        NodePointer(steps)
    }

    pub fn parent(&self) -> Option<NodePointer> {
        let (_, rest) = self.0.split_last()?;
        Some(NodePointer(rest.to_vec()))
    }

    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut node = untag(root);
        for step in &self.0 {
            let child = match step {
                Step::Key(key) => node.get(key.as_str())?,
                Step::Index(idx) => node.get(*idx)?,
            };
            node = untag(child);
        }
        Some(node)
    }

    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = untag_mut(root);
        for step in &self.0 {
            let child = match step {
                Step::Key(key) => node.get_mut(key.as_str())?,
                Step::Index(idx) => node.get_mut(*idx)?,
            };
            node = untag_mut(child);
        }
        Some(node)
    }
}

impl Display for NodePointer {
    /// `spec/containers[0]/env[1]/name`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, step) in self.0.iter().enumerate() {
            match step {
                Step::Key(key) if idx == 0 => write!(f, "{key}")?,
                Step::Key(key) => write!(f, "/{key}")?,
                Step::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// A replaceable reference value found by [`select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// The addressed node is itself a string.
    Scalar { pointer: NodePointer, value: String },
    /// One string element of an addressed sequence. `pointer` addresses the sequence.
    SequenceElement {
        pointer: NodePointer,
        index: usize,
        value: String,
    },
    /// A mapping with a `name` child and optionally a `namespace` child.
    NameNamespace {
        pointer: NodePointer,
        name: String,
        namespace: Option<String>,
    },
}

impl Location {
    pub fn pointer(&self) -> &NodePointer {
        match self {
            Location::Scalar { pointer, .. }
            | Location::SequenceElement { pointer, .. }
            | Location::NameNamespace { pointer, .. } => pointer,
        }
    }

    /// The name value to match against candidates.
    pub fn name(&self) -> &str {
        match self {
            Location::Scalar { value, .. } | Location::SequenceElement { value, .. } => value,
            Location::NameNamespace { name, .. } => name,
        }
    }

    /// The namespace constraint carried alongside the name, if any.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Location::NameNamespace { namespace, .. } => namespace.as_deref(),
            _ => None,
        }
    }

    /// Address of the string holding the name, for reporting.
    pub fn field(&self) -> String {
        match self {
            Location::Scalar { pointer, .. } => pointer.to_string(),
            Location::SequenceElement { pointer, index, .. } => {
                pointer.child(Step::Index(*index)).to_string()
            }
            Location::NameNamespace { pointer, .. } => {
                pointer.child(Step::Key("name".to_string())).to_string()
            }
        }
    }

    /// The `kind` declared next to the name, when the name lives in a mapping that has one.
    ///
    /// Elements of a string sequence have no such sibling.
    pub fn sibling_kind<'a>(&self, root: &'a Value) -> Option<&'a str> {
        let holder = match self {
            Location::Scalar { pointer, .. } => match pointer.steps().last() {
                Some(Step::Key(_)) => pointer.parent()?,
                _ => return None,
            },
            Location::NameNamespace { pointer, .. } => pointer.clone(),
            Location::SequenceElement { .. } => return None,
        };
        match holder.get(root)?.get("kind").map(untag) {
            Some(Value::String(kind)) => Some(kind.as_str()),
            _ => None,
        }
    }

    /// Replace the name (and the namespace, when this location carries one) inside `root`.
    ///
    /// Returns false if the location no longer exists in `root`.
    pub fn write(&self, root: &mut Value, name: &str, namespace: Option<&str>) -> bool {
        let Some(node) = self.pointer().get_mut(root) else {
            return false;
        };
        match self {
            Location::Scalar { .. } => {
                *node = Value::String(name.to_string());
                true
            }
            Location::SequenceElement { index, .. } => match node.get_mut(*index) {
                Some(element) => {
                    *untag_mut(element) = Value::String(name.to_string());
                    true
                }
                None => false,
            },
            Location::NameNamespace {
                namespace: current_ns,
                ..
            } => {
                let Some(name_node) = node.get_mut("name") else {
                    return false;
                };
                *untag_mut(name_node) = Value::String(name.to_string());
                if let (Some(_), Some(namespace)) = (current_ns, namespace) {
                    if let Some(ns_node) = node.get_mut("namespace") {
                        *untag_mut(ns_node) = Value::String(namespace.to_string());
                    }
                }
                true
            }
        }
    }
}

/// Find every location `path` designates in `root`.
///
/// Missing keys, and scalars met before the path is exhausted, yield no locations. Sequences
/// met before the path is exhausted are traversed element-wise. `referrer` is the label used in
/// diagnostics.
pub fn select(
    root: &Value,
    path: &FieldPath,
    referrer: &str,
) -> Result<Vec<Location>, NameRefError> {
    let mut selector = Selector {
        path,
        referrer,
        found: Vec::new(),
    };
    selector.walk(root, path.segments(), NodePointer::default())?;
    tracing::trace!(
        "[paths::select] '{}' matched {} locations in obj '{}'",
        path,
        selector.found.len(),
        referrer
    );
    Ok(selector.found)
}

struct Selector<'a> {
    path: &'a FieldPath,
    referrer: &'a str,
    found: Vec<Location>,
}

impl Selector<'_> {
    fn walk(
        &mut self,
        node: &Value,
        segments: &[String],
        pointer: NodePointer,
    ) -> Result<(), NameRefError> {
        let node = untag(node);
        let Some((head, rest)) = segments.split_first() else {
            return self.classify(node, pointer);
        };
        match node {
            Value::Mapping(map) => match map.get(head.as_str()) {
                Some(child) => self.walk(child, rest, pointer.child(Step::Key(head.clone()))),
                None => Ok(()),
            },
            Value::Sequence(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.walk(item, segments, pointer.child(Step::Index(idx)))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn classify(&mut self, node: &Value, pointer: NodePointer) -> Result<(), NameRefError> {
        match node {
            Value::String(value) => {
                self.found.push(Location::Scalar {
                    pointer,
                    value: value.clone(),
                });
            }
            Value::Sequence(items) => {
                let mut elements = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let Value::String(value) = untag(item) else {
                        return Err(self.shape_error());
                    };
                    elements.push(Location::SequenceElement {
                        pointer: pointer.clone(),
                        index,
                        value: value.clone(),
                    });
                }
                self.found.extend(elements);
            }
            Value::Mapping(map) => {
                let name = match map.get("name").map(untag) {
                    Some(Value::String(name)) => name.clone(),
                    Some(_) => return Err(self.shape_error()),
                    None => {
                        return Err(NameRefError::MissingNameField {
                            referrer: self.referrer.to_string(),
                            path: self.path.to_string(),
                        })
                    }
                };
                let namespace = match map.get("namespace").map(untag) {
                    Some(Value::String(namespace)) => Some(namespace.clone()),
                    Some(Value::Null) | None => None,
                    Some(_) => return Err(self.shape_error()),
                };
                self.found.push(Location::NameNamespace {
                    pointer,
                    name,
                    namespace,
                });
            }
            _ => return Err(self.shape_error()),
        }
        Ok(())
    }

    fn shape_error(&self) -> NameRefError {
        NameRefError::Shape {
            referrer: self.referrer.to_string(),
            path: self.path.to_string(),
        }
    }
}

fn untag(node: &Value) -> &Value {
    match node {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn untag_mut(node: &mut Value) -> &mut Value {
    match node {
        Value::Tagged(tagged) => untag_mut(&mut tagged.value),
        other => other,
    }
}
