//! Rewriting stale name references.
//!
//! A [`NameRefFilter`] pairs a [`FieldSpec`] (where the reference lives in the referrer) with a
//! target [`Gvk`] (what type of resource it refers to). Applying it to a referrer locates every
//! reference field, matches each field's value against the original identities of the
//! type-selected candidates, and rewrites matched fields to the candidate's current identity.
//!
//! Each location is decided on its own:
//!
//! - no candidate matches: the field is left as is;
//! - one candidate matches: the field takes the candidate's current name (and namespace, when
//!   the field is a `{name, namespace}` mapping);
//! - several candidates match: the call fails with [`NameRefError::AmbiguousReference`].
//!
//! All locations are resolved before any is written, so a failed call leaves the referrer
//! untouched.
//!
//! A field spec marked `checkKind` only considers names whose enclosing mapping declares a
//! `kind` equal to the target's, as in `roleRef` or `subjects` entries.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::str::FromStr;

use crate::{
    candidates::{Candidate, CandidateRegistry},
    error::NameRefError,
    paths::{select, FieldPath, Location},
    resid::Gvk,
    resource::Resource,
};

/// Where a reference field lives, optionally restricted to referrers of a given type.
///
/// The flattened `group`/`version`/`kind` select referrers; empty components match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub gvk: Gvk,
    pub path: FieldPath,
    /// Require a sibling `kind` naming the target type.
    #[serde(rename = "checkKind", default, skip_serializing_if = "std::ops::Not::not")]
    pub check_kind: bool,
}

impl FieldSpec {
    /// A field spec that applies to referrers of any type.
    pub fn new(path: &str) -> Result<FieldSpec, NameRefError> {
        Ok(FieldSpec {
            gvk: Gvk::default(),
            path: FieldPath::from_str(path)?,
            check_kind: false,
        })
    }

    pub fn for_referrer(gvk: Gvk, path: &str) -> Result<FieldSpec, NameRefError> {
        Ok(FieldSpec {
            gvk,
            path: FieldPath::from_str(path)?,
            check_kind: false,
        })
    }

    pub fn with_kind_check(mut self) -> FieldSpec {
        self.check_kind = true;
        self
    }

    pub fn applies_to(&self, referrer: &Gvk) -> bool {
        referrer.is_selected_by(&self.gvk)
    }
}

/// One field changed by [`NameRefFilter::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Concrete address of the rewritten name, e.g. `seq[0]` or `map/name`.
    pub field: String,
    pub old_name: String,
    pub new_name: String,
    pub old_namespace: Option<String>,
    pub new_namespace: Option<String>,
}

impl Rewrite {
    fn new(location: &Location, candidate: &Candidate) -> Rewrite {
        let old_namespace = location.namespace().map(str::to_string);
        let new_namespace = old_namespace
            .as_ref()
            .map(|_| candidate.current.namespace.clone());
        Rewrite {
            field: location.field(),
            old_name: location.name().to_string(),
            new_name: candidate.current.name.clone(),
            old_namespace,
            new_namespace,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old_name == self.new_name && self.old_namespace == self.new_namespace
    }
}

/// A location resolved to exactly one candidate, not yet written.
#[derive(Debug, Clone)]
pub(crate) struct PlannedRewrite<'c> {
    /// The field spec path the location was found through.
    pub(crate) path: String,
    pub(crate) location: Location,
    pub(crate) candidate: &'c Candidate,
}

/// Write every planned rewrite into `referrer`, skipping the ones that change nothing.
pub(crate) fn write_planned(
    referrer: &mut Resource,
    planned: Vec<PlannedRewrite<'_>>,
) -> Vec<Rewrite> {
    let label = referrer.label();
    let mut rewrites = Vec::new();
    for PlannedRewrite {
        location,
        candidate,
        ..
    } in planned
    {
        let rewrite = Rewrite::new(&location, candidate);
        if rewrite.is_noop() {
            continue;
        }
        if !location.write(
            referrer.node_mut(),
            &rewrite.new_name,
            rewrite.new_namespace.as_deref(),
        ) {
            tracing::warn!(
                "[write_planned] location {} vanished from obj '{}' before rewrite",
                rewrite.field,
                label
            );
            continue;
        }
        tracing::debug!(
            "[write_planned] obj '{}' {}: '{}' -> '{}' ({})",
            label,
            rewrite.field,
            rewrite.old_name,
            rewrite.new_name,
            candidate
        );
        rewrites.push(rewrite);
    }
    rewrites
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRefFilter {
    field_spec: FieldSpec,
    target: Gvk,
}

impl NameRefFilter {
    pub fn new(field_spec: FieldSpec, target: Gvk) -> NameRefFilter {
        NameRefFilter { field_spec, target }
    }

    pub fn field_spec(&self) -> &FieldSpec {
        &self.field_spec
    }

    pub fn target(&self) -> &Gvk {
        &self.target
    }

    /// Rewrite the references `referrer` holds at this filter's path.
    ///
    /// Returns the fields that changed. Referrers the field spec does not select are left alone.
    /// On error `referrer` is not modified.
    pub fn apply(
        &self,
        referrer: &mut Resource,
        candidates: &CandidateRegistry,
    ) -> Result<Vec<Rewrite>, NameRefError> {
        let planned = self.plan(referrer, candidates)?;
        Ok(write_planned(referrer, planned))
    }

    /// Resolve every location without touching `referrer`.
    pub(crate) fn plan<'c>(
        &self,
        referrer: &Resource,
        candidates: &'c CandidateRegistry,
    ) -> Result<Vec<PlannedRewrite<'c>>, NameRefError> {
        if !self.field_spec.applies_to(&referrer.gvk()) {
            tracing::trace!(
                "[NameRefFilter::plan] field spec {}:{} does not select obj '{}'",
                self.field_spec.gvk,
                self.field_spec.path,
                referrer.label()
            );
            return Ok(Vec::new());
        }
        let label = referrer.label();
        let mut locations = select(referrer.node(), &self.field_spec.path, &label)?;
        if self.field_spec.check_kind {
            locations.retain(|location| self.kind_matches(referrer.node(), location));
        }
        if locations.is_empty() {
            return Ok(Vec::new());
        }

        let eligible = candidates.select(&self.target).collect::<Vec<_>>();
        let mut planned = Vec::new();
        for location in locations {
            if let Some(candidate) = self.resolve(&location, &eligible, &label)? {
                planned.push(PlannedRewrite {
                    path: self.field_spec.path.to_string(),
                    location,
                    candidate,
                });
            }
        }
        Ok(planned)
    }

    fn kind_matches(&self, root: &Value, location: &Location) -> bool {
        match location.sibling_kind(root) {
            Some(kind) => self.target.kind.is_empty() || self.target.kind == kind,
            None => {
                tracing::trace!(
                    "[NameRefFilter::kind_matches] {} declares no kind, skipped",
                    location.field()
                );
                false
            }
        }
    }

    /// Decide which candidate, if any, a single location refers to.
    fn resolve<'c>(
        &self,
        location: &Location,
        eligible: &[&'c Candidate],
        label: &str,
    ) -> Result<Option<&'c Candidate>, NameRefError> {
        let matches = eligible
            .iter()
            .copied()
            .filter(|candidate| candidate.matches(location.name(), location.namespace()))
            .collect::<Vec<_>>();
        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(NameRefError::AmbiguousReference {
                referrer: label.to_string(),
                path: self.field_spec.path.to_string(),
                value: location.name().to_string(),
                candidates: many.iter().map(|candidate| candidate.to_string()).collect(),
            }),
        }
    }
}
