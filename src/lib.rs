//! # nameref
//!
//! Repairs cross-document name references after resources in a collection have been renamed.
//!
//! ## Overview
//!
//! Earlier stages of a resource build pipeline may rename resources (prefixes, suffixes, content
//! hashes) while other resources still refer to them by their old names. nameref takes one
//! referrer document, a field path, a target resource type and the set of candidate resources of
//! that type, each tagged with its current and original identity, and rewrites every stale
//! reference to the candidate's current name.
//!
//! ## Architecture
//!
//! - **[`paths`]**: Field path syntax ([`paths::FieldPath`]) and the selector that turns a path
//!   into replaceable [`paths::Location`]s
//! - **[`resid`]**: Type selectors ([`resid::Gvk`]) and resource identities
//! - **[`candidates`]**: [`candidates::CandidateRegistry`], resources with original/current identity
//! - **[`filter`]**: [`filter::NameRefFilter`], the matching and rewrite step
//! - **[`config`]**: Declarative tables of which fields reference which types
//! - **[`resource`]**: Parsed documents and their identity fields
//!
//! ## Quick Start
//!
//! ```rust
//! use nameref::{
//!     candidates::CandidateRegistry,
//!     filter::{FieldSpec, NameRefFilter},
//!     resid::Gvk,
//!     resource::Resource,
//! };
//! use std::str::FromStr;
//!
//! # fn main() -> Result<(), nameref::NameRefError> {
//! let mut referrer = Resource::from_str(
//!     "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: dep\nref:\n  name: oldName\n",
//! )?;
//! let candidates = CandidateRegistry::from_yaml_with_original_names(
//!     "apiVersion: apps/v1\nkind: Secret\nmetadata:\n  name: newName\n",
//!     &["oldName"],
//! )?;
//!
//! let filter = NameRefFilter::new(FieldSpec::new("ref/name")?, Gvk::new("apps", "v1", "Secret"));
//! let rewrites = filter.apply(&mut referrer, &candidates)?;
//!
//! assert_eq!(rewrites[0].new_name, "newName");
//! assert_eq!(
//!     referrer.node()["ref"]["name"].as_str(),
//!     Some("newName")
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Resolution never guesses. A field whose value matches several candidates fails with
//! [`NameRefError::AmbiguousReference`]; a field of the wrong shape fails with
//! [`NameRefError::Shape`] or [`NameRefError::MissingNameField`]. A field matching no candidate
//! is left alone. A failed call does not modify the referrer.
//!
//! ## Concurrency
//!
//! Resolution is synchronous and reads the candidate registry without mutating it. A registry
//! may be shared across threads for concurrent resolutions of distinct referrers.

pub mod candidates;
pub mod config;
pub mod error;
pub mod filter;
pub mod paths;
pub mod resid;
pub mod resource;
#[cfg(test)]
mod tests;

pub use error::*;
