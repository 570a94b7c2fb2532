//! [crate::resid] contains the type and identity keys used to match a referrer's fields against
//! [crate::candidates::Candidate] resources.
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Group, version and kind of a resource.
///
/// When used as a selector, an empty component matches any value. See [`Gvk::is_selected_by`].
#[derive(
    Debug, Default, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash,
)]
#[serde(default)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: &str, version: &str, kind: &str) -> Gvk {
        Gvk {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Build a Gvk from a resource's `apiVersion` and `kind` fields.
    ///
    /// `apps/v1` splits into group `apps` and version `v1`; a bare `v1` is the core group.
    pub fn from_api_version(api_version: &str, kind: &str) -> Gvk {
        let (group, version) = match api_version.rsplit_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        Gvk::new(group, version, kind)
    }

    /// The `apiVersion` field value this Gvk serializes to.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// True when every non-empty component of `selector` equals the matching component of self.
    pub fn is_selected_by(&self, selector: &Gvk) -> bool {
        (selector.group.is_empty() || selector.group == self.group)
            && (selector.version.is_empty() || selector.version == self.version)
            && (selector.kind.is_empty() || selector.kind == self.kind)
    }

    pub fn is_wildcard(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

impl Display for Gvk {
    /// `Kind.version.group`, dropping empty trailing components.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut pieces = vec![self.kind.as_str()];
        if !self.version.is_empty() || !self.group.is_empty() {
            pieces.push(self.version.as_str());
        }
        if !self.group.is_empty() {
            pieces.push(self.group.as_str());
        }
        write!(f, "{}", pieces.join("."))
    }
}

/// Name and namespace of a resource. An empty namespace means cluster scoped or unspecified.
#[derive(
    Debug, Default, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash,
)]
#[serde(default)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    pub fn new(name: &str, namespace: &str) -> ObjectRef {
        ObjectRef {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.name, self.namespace)
        }
    }
}

/// Full identity of a resource: its type plus its name and namespace.
#[derive(
    Debug, Default, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq, Hash,
)]
pub struct ResId {
    pub gvk: Gvk,
    pub object: ObjectRef,
}

impl ResId {
    pub fn new(gvk: Gvk, name: &str, namespace: &str) -> ResId {
        ResId {
            gvk,
            object: ObjectRef::new(name, namespace),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn namespace(&self) -> &str {
        &self.object.namespace
    }
}

impl Display for ResId {
    /// `Kind.version.group/name.namespace`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.gvk, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_version() {
        assert_eq!(
            Gvk::from_api_version("apps/v1", "Deployment"),
            Gvk::new("apps", "v1", "Deployment")
        );
        assert_eq!(
            Gvk::from_api_version("v1", "Secret"),
            Gvk::new("", "v1", "Secret")
        );
        assert_eq!(
            Gvk::from_api_version("rbac.authorization.k8s.io/v1", "Role").group,
            "rbac.authorization.k8s.io"
        );
        assert_eq!(Gvk::new("", "v1", "Secret").api_version(), "v1");
        assert_eq!(Gvk::new("apps", "v1", "Secret").api_version(), "apps/v1");
    }

    #[test]
    fn test_selection_treats_empty_as_wildcard() {
        let secret = Gvk::new("apps", "v1", "Secret");
        assert!(secret.is_selected_by(&Gvk::new("apps", "v1", "Secret")));
        assert!(secret.is_selected_by(&Gvk::new("", "", "Secret")));
        assert!(secret.is_selected_by(&Gvk::default()));
        assert!(Gvk::default().is_wildcard());
        assert!(!secret.is_wildcard());
        assert!(!secret.is_selected_by(&Gvk::new("apps", "v1", "NotSecret")));
        assert!(!secret.is_selected_by(&Gvk::new("", "v2", "")));
        // Wildcards only apply on the selector side
        assert!(!Gvk::new("", "", "Secret").is_selected_by(&Gvk::new("apps", "", "")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Gvk::new("apps", "v1", "Deployment").to_string(), "Deployment.v1.apps");
        assert_eq!(Gvk::new("", "v1", "Secret").to_string(), "Secret.v1");
        assert_eq!(Gvk::new("", "", "Secret").to_string(), "Secret");
        let id = ResId::new(Gvk::new("", "v1", "Secret"), "creds", "prod");
        assert_eq!(id.to_string(), "Secret.v1/creds.prod");
        let id = ResId::new(Gvk::new("apps", "v1", "Deployment"), "dep", "");
        assert_eq!(id.to_string(), "Deployment.v1.apps/dep");
    }
}
