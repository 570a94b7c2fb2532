//! Resources eligible to satisfy a name reference.
//!
//! Every [`Candidate`] carries two identities: the one it has now, written into referrers as the
//! replacement value, and the one it had before this pipeline run renamed it, which is what
//! stale references in referrers still hold.

use std::fmt::{Display, Formatter};

use crate::{
    error::NameRefError,
    resid::{Gvk, ObjectRef, ResId},
    resource::Resource,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub gvk: Gvk,
    pub current: ObjectRef,
    pub original: ObjectRef,
}

impl Candidate {
    /// A candidate that was never renamed: its original identity is its current one.
    pub fn new(gvk: Gvk, name: &str, namespace: &str) -> Candidate {
        let current = ObjectRef::new(name, namespace);
        Candidate {
            gvk,
            original: current.clone(),
            current,
        }
    }

    /// Record the name this candidate had before renaming. Any string is accepted, including
    /// an empty one.
    pub fn with_original_name(mut self, name: &str) -> Candidate {
        self.original.name = name.to_string();
        self
    }

    pub fn with_original_namespace(mut self, namespace: &str) -> Candidate {
        self.original.namespace = namespace.to_string();
        self
    }

    /// Build a candidate from a resource, reading its rename history annotations.
    pub fn from_resource(resource: &Resource) -> Candidate {
        Candidate {
            gvk: resource.gvk(),
            current: ObjectRef::new(resource.name(), resource.namespace()),
            original: ObjectRef::new(resource.original_name(), resource.original_namespace()),
        }
    }

    pub fn id(&self) -> ResId {
        ResId {
            gvk: self.gvk.clone(),
            object: self.current.clone(),
        }
    }

    pub fn original_id(&self) -> ResId {
        ResId {
            gvk: self.gvk.clone(),
            object: self.original.clone(),
        }
    }

    pub fn was_renamed(&self) -> bool {
        self.current != self.original
    }

    /// True when this candidate's original identity is the one `name`/`namespace` refers to.
    ///
    /// A `None` namespace matches any namespace.
    pub fn matches(&self, name: &str, namespace: Option<&str>) -> bool {
        self.original.name == name
            && namespace.map_or(true, |namespace| self.original.namespace == namespace)
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// The set of resources a referrer's fields may resolve to.
///
/// Resolution only ever reads the registry, so one registry can be shared (for example behind
/// an `Arc`) by any number of concurrent resolutions, as long as each referrer is mutated by a
/// single resolution at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    pub fn new(candidates: Vec<Candidate>) -> CandidateRegistry {
        CandidateRegistry { candidates }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn from_resources<'a, I>(resources: I) -> CandidateRegistry
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        resources.into_iter().map(Candidate::from_resource).collect()
    }

    /// Parse a YAML stream and pair each document, in order, with the name it had before
    /// renaming.
    ///
    /// The pairing is literal: an empty string records an empty original name. Documents
    /// beyond the end of `original_names` keep their annotation-derived original identity.
    pub fn from_yaml_with_original_names(
        text: &str,
        original_names: &[&str],
    ) -> Result<CandidateRegistry, NameRefError> {
        let resources = Resource::from_yaml_stream(text)?;
        Ok(resources
            .iter()
            .enumerate()
            .map(|(idx, resource)| {
                let candidate = Candidate::from_resource(resource);
                match original_names.get(idx) {
                    Some(name) => candidate.with_original_name(name),
                    None => candidate,
                }
            })
            .collect())
    }

    /// Every candidate whose type is selected by `target`.
    pub fn select<'a, 'g>(&'a self, target: &'g Gvk) -> impl Iterator<Item = &'a Candidate> + 'g
    where
        'a: 'g,
    {
        self.candidates
            .iter()
            .filter(move |candidate| candidate.gvk.is_selected_by(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<Candidate> for CandidateRegistry {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        CandidateRegistry::new(iter.into_iter().collect())
    }
}
