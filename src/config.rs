use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

use crate::{
    candidates::CandidateRegistry,
    error::NameRefError,
    filter::{write_planned, FieldSpec, NameRefFilter, PlannedRewrite, Rewrite},
    paths::FieldPath,
    resid::Gvk,
    resource::Resource,
};

/// Default reference tables for the common workload types.
pub static BUILTIN_NAME_REFERENCES: Lazy<NameRefConfig> = Lazy::new(NameRefConfig::builtin);

/// Which fields, in which referrer types, refer to resources of one target type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameBackReferences {
    #[serde(flatten)]
    pub gvk: Gvk,
    #[serde(rename = "fieldSpecs", default)]
    pub field_specs: Vec<FieldSpec>,
}

/// The full set of name reference tables.
///
/// ```toml
/// [[nameReference]]
/// version = "v1"
/// kind = "Secret"
///
/// [[nameReference.fieldSpecs]]
/// kind = "Pod"
/// path = "spec/volumes/secret/secretName"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRefConfig {
    #[serde(rename = "nameReference", default)]
    pub name_reference: Vec<NameBackReferences>,
}

impl NameRefConfig {
    pub fn from_toml_str(text: &str) -> Result<NameRefConfig, NameRefError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<NameRefConfig, NameRefError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, NameRefError> {
        Ok(toml::to_string(self)?)
    }

    /// Load a config file, choosing the format from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<NameRefConfig, NameRefError> {
        let path = path.as_ref();
        tracing::debug!("[NameRefConfig::from_path] reading {:?}", path);
        let content = read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => NameRefConfig::from_toml_str(&content),
            Some("yaml") | Some("yml") => NameRefConfig::from_yaml_str(&content),
            _ => Err(NameRefError::Serialization(format!(
                "Unsupported name reference config format: {}",
                path.display()
            ))),
        }
    }

    /// Add `other`'s tables. Field specs for a target already present are appended to it,
    /// skipping exact duplicates.
    pub fn merge(&mut self, other: NameRefConfig) {
        for incoming in other.name_reference {
            match self
                .name_reference
                .iter_mut()
                .find(|existing| existing.gvk == incoming.gvk)
            {
                Some(existing) => {
                    for spec in incoming.field_specs {
                        if !existing.field_specs.contains(&spec) {
                            existing.field_specs.push(spec);
                        }
                    }
                }
                None => self.name_reference.push(incoming),
            }
        }
    }

    /// Every filter whose field spec selects `referrer`'s type.
    pub fn filters_for(&self, referrer: &Resource) -> Vec<NameRefFilter> {
        let gvk = referrer.gvk();
        self.name_reference
            .iter()
            .flat_map(|backrefs| {
                backrefs
                    .field_specs
                    .iter()
                    .filter(|spec| spec.applies_to(&gvk))
                    .map(|spec| NameRefFilter::new(spec.clone(), backrefs.gvk.clone()))
            })
            .collect()
    }

    /// Run every applicable filter against `referrer`.
    ///
    /// Every filter resolves against the referrer as it was passed in. A field that two
    /// filters resolve to different candidates is an [`NameRefError::AmbiguousReference`].
    /// Either every filter succeeds and all rewrites land, or the first error is returned and
    /// `referrer` is left as it was.
    pub fn apply(
        &self,
        referrer: &mut Resource,
        candidates: &CandidateRegistry,
    ) -> Result<Vec<Rewrite>, NameRefError> {
        let mut planned: Vec<PlannedRewrite<'_>> = Vec::new();
        for filter in self.filters_for(referrer) {
            for next in filter.plan(referrer, candidates)? {
                let field = next.location.field();
                match planned
                    .iter()
                    .find(|existing| existing.location.field() == field)
                {
                    Some(existing) if existing.candidate == next.candidate => {}
                    Some(existing) => {
                        return Err(NameRefError::AmbiguousReference {
                            referrer: referrer.label(),
                            path: next.path,
                            value: next.location.name().to_string(),
                            candidates: vec![
                                existing.candidate.to_string(),
                                next.candidate.to_string(),
                            ],
                        })
                    }
                    None => planned.push(next),
                }
            }
        }
        Ok(write_planned(referrer, planned))
    }

    /// The default tables: references to config, credentials, accounts, claims, services,
    /// roles and workloads from the built-in workload and RBAC types.
    pub fn builtin() -> NameRefConfig {
        let mut config = NameRefConfig::default();

        config.add(
            Gvk::new("", "v1", "ConfigMap"),
            pod_spec_refs(&[
                "volumes/configMap/name",
                "volumes/projected/sources/configMap/name",
                "containers/env/valueFrom/configMapKeyRef/name",
                "containers/envFrom/configMapRef/name",
                "initContainers/env/valueFrom/configMapKeyRef/name",
                "initContainers/envFrom/configMapRef/name",
            ]),
        );

        let mut secret_refs = pod_spec_refs(&[
            "volumes/secret/secretName",
            "volumes/projected/sources/secret/name",
            "containers/env/valueFrom/secretKeyRef/name",
            "containers/envFrom/secretRef/name",
            "initContainers/env/valueFrom/secretKeyRef/name",
            "initContainers/envFrom/secretRef/name",
            "imagePullSecrets/name",
        ]);
        secret_refs.extend([
            spec("networking.k8s.io", "Ingress", "spec/tls/secretName"),
            spec("", "ServiceAccount", "imagePullSecrets/name"),
            spec("", "ServiceAccount", "secrets/name"),
        ]);
        config.add(Gvk::new("", "v1", "Secret"), secret_refs);

        let mut account_refs = pod_spec_refs(&["serviceAccountName"]);
        account_refs.extend([
            spec("rbac.authorization.k8s.io", "RoleBinding", "subjects/name").with_kind_check(),
            spec("rbac.authorization.k8s.io", "ClusterRoleBinding", "subjects/name")
                .with_kind_check(),
        ]);
        config.add(Gvk::new("", "v1", "ServiceAccount"), account_refs);

        config.add(
            Gvk::new("", "v1", "PersistentVolumeClaim"),
            pod_spec_refs(&["volumes/persistentVolumeClaim/claimName"]),
        );

        config.add(
            Gvk::new("", "v1", "Service"),
            vec![
                spec("apps", "StatefulSet", "spec/serviceName"),
                spec(
                    "networking.k8s.io",
                    "Ingress",
                    "spec/rules/http/paths/backend/service/name",
                ),
                spec("networking.k8s.io", "Ingress", "spec/defaultBackend/service/name"),
            ],
        );

        config.add(
            Gvk::new("rbac.authorization.k8s.io", "v1", "Role"),
            vec![
                spec("rbac.authorization.k8s.io", "RoleBinding", "roleRef/name").with_kind_check(),
            ],
        );
        config.add(
            Gvk::new("rbac.authorization.k8s.io", "v1", "ClusterRole"),
            vec![
                spec("rbac.authorization.k8s.io", "RoleBinding", "roleRef/name").with_kind_check(),
                spec("rbac.authorization.k8s.io", "ClusterRoleBinding", "roleRef/name")
                    .with_kind_check(),
            ],
        );

        for workload in ["Deployment", "StatefulSet", "ReplicaSet"] {
            config.add(
                Gvk::new("apps", "v1", workload),
                vec![spec(
                    "autoscaling",
                    "HorizontalPodAutoscaler",
                    "spec/scaleTargetRef/name",
                )
                .with_kind_check()],
            );
        }

        config
    }

    fn add(&mut self, target: Gvk, field_specs: Vec<FieldSpec>) {
        self.merge(NameRefConfig {
            name_reference: vec![NameBackReferences {
                gvk: target,
                field_specs,
            }],
        });
    }
}

/// Where each built-in workload type keeps its pod spec.
const POD_SPEC_PREFIXES: &[(&str, &str, &str)] = &[
    ("", "Pod", "spec"),
    ("apps", "Deployment", "spec/template/spec"),
    ("apps", "ReplicaSet", "spec/template/spec"),
    ("apps", "DaemonSet", "spec/template/spec"),
    ("apps", "StatefulSet", "spec/template/spec"),
    ("batch", "Job", "spec/template/spec"),
    ("batch", "CronJob", "spec/jobTemplate/spec/template/spec"),
];

fn pod_spec_refs(suffixes: &[&str]) -> Vec<FieldSpec> {
    POD_SPEC_PREFIXES
        .iter()
        .flat_map(|(group, kind, prefix)| {
            suffixes
                .iter()
                .map(move |suffix| spec(group, kind, &format!("{prefix}/{suffix}")))
        })
        .collect()
}

/// Built-in paths are static, slash separated, and never empty.
fn spec(group: &str, kind: &str, path: &str) -> FieldSpec {
    FieldSpec {
        gvk: Gvk::new(group, "", kind),
        path: FieldPath::from_static(path),
        check_kind: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_builtin_covers_pod_spec_secrets() {
        let config = NameRefConfig::builtin();
        let deployment = Resource::from_str(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: dep\n",
        )
        .unwrap();
        let filters = config.filters_for(&deployment);
        assert!(filters.iter().any(|f| {
            f.target().kind == "Secret"
                && f.field_spec().path.as_str() == "spec/template/spec/volumes/secret/secretName"
        }));
        assert!(filters.iter().all(|f| f.target().kind != "Deployment"));
        assert_eq!(*BUILTIN_NAME_REFERENCES, config);
    }

    #[test]
    fn test_builtin_paths_parse() {
        for backrefs in &NameRefConfig::builtin().name_reference {
            for spec in &backrefs.field_specs {
                let reparsed = FieldPath::from_str(spec.path.as_str()).unwrap();
                assert_eq!(reparsed, spec.path);
            }
        }
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut config = NameRefConfig::from_toml_str(
            r#"
[[nameReference]]
version = "v1"
kind = "Secret"

[[nameReference.fieldSpecs]]
kind = "Pod"
path = "spec/volumes/secret/secretName"
"#,
        )
        .unwrap();
        let other = config.clone();
        config.merge(other);
        assert_eq!(config.name_reference.len(), 1);
        assert_eq!(config.name_reference[0].field_specs.len(), 1);
    }

    #[test]
    fn test_kind_check_flag_is_optional() {
        let config = NameRefConfig::from_yaml_str(
            r#"
nameReference:
- kind: Role
  fieldSpecs:
  - kind: RoleBinding
    path: roleRef/name
    checkKind: true
  - kind: Widget
    path: spec/role
"#,
        )
        .unwrap();
        let specs = &config.name_reference[0].field_specs;
        assert!(specs[0].check_kind);
        assert!(!specs[1].check_kind);
        let text = config.to_toml_string().unwrap();
        assert_eq!(text.matches("checkKind").count(), 1);
    }

    #[test]
    fn test_toml_round_trip_preserves_tables() {
        let config = NameRefConfig::builtin();
        let text = config.to_toml_string().unwrap();
        assert_eq!(NameRefConfig::from_toml_str(&text).unwrap(), config);
    }
}
