//! Typed collection registry.
//!
//! Built once from [`ResourceAccessConfig`] and validated eagerly; read-only
//! afterwards and safe to share across threads.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use resource_access_sdk::{Target, Verb};
use thiserror::Error;
use tracing::debug;

use crate::config::{
    ActionSpecConfig, CollectionConfig, CollectionOption, Identifiers, ResourceAccessConfig,
};
use crate::domain::locator::is_version_tag;

/// Malformed registry configuration, detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("collection '{collection}' references unknown subcollection '{subcollection}'")]
    UnknownSubcollection {
        collection: String,
        subcollection: String,
    },

    #[error("collection '{collection}' is backed by unknown type '{klass}'")]
    UnknownType { collection: String, klass: String },

    #[error("collection '{collection}' declares {target} actions for undeclared verb {verb}")]
    UndeclaredVerb {
        collection: String,
        target: Target,
        verb: Verb,
    },

    #[error("collection '{collection}' declares an unnamed {target} action for {verb}")]
    EmptyActionName {
        collection: String,
        target: Target,
        verb: Verb,
    },

    #[error("collection '{collection}' declares {target} action '{name}' twice for {verb}")]
    DuplicateAction {
        collection: String,
        target: Target,
        verb: Verb,
        name: String,
    },

    #[error("action '{action}' of collection '{collection}' has an empty permission identifier")]
    EmptyIdentifier { collection: String, action: String },

    #[error("'{version}' is not a valid version tag")]
    InvalidVersion { version: String },
}

/// One declared action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: String,
    /// Any-match permission identifiers. Empty means allowed by default.
    pub identifiers: Vec<String>,
    pub disabled: bool,
    pub validate: Option<String>,
}

impl ActionSpec {
    /// First of `identifiers` granted by `allows`, or `Ok(None)` when none are declared.
    ///
    /// # Errors
    ///
    /// Returns the declared identifiers when none of them is granted.
    pub fn granted_identifier(
        &self,
        allows: impl Fn(&str) -> bool,
    ) -> Result<Option<&str>, &[String]> {
        if self.identifiers.is_empty() {
            return Ok(None);
        }
        self.identifiers
            .iter()
            .find(|id| allows(id))
            .map(|id| Some(id.as_str()))
            .ok_or(self.identifiers.as_slice())
    }

    fn from_config(spec: ActionSpecConfig) -> Self {
        Self {
            name: spec.name,
            identifiers: spec.identifier.map(Identifiers::into_vec).unwrap_or_default(),
            disabled: spec.disabled,
            validate: spec.validate,
        }
    }
}

/// Actions of one target kind, grouped by verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    by_verb: BTreeMap<Verb, Vec<ActionSpec>>,
}

impl ActionSet {
    #[must_use]
    pub fn find(&self, verb: Verb, name: &str) -> Option<&ActionSpec> {
        self.by_verb.get(&verb)?.iter().find(|a| a.name == name)
    }

    /// Every declared action with its verb.
    pub fn declared(&self) -> impl Iterator<Item = (Verb, &ActionSpec)> {
        self.by_verb
            .iter()
            .flat_map(|(verb, specs)| specs.iter().map(move |spec| (*verb, spec)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_verb.values().all(Vec::is_empty)
    }
}

/// Validated registry entry of one collection.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub name: String,
    pub description: String,
    pub klass: Option<String>,
    pub verbs: BTreeSet<Verb>,
    pub options: HashSet<CollectionOption>,
    pub identifying_attrs: Vec<String>,
    pub subcollections: Vec<String>,
    pub handlers: Option<Vec<String>>,
    actions: HashMap<Target, ActionSet>,
}

impl CollectionEntry {
    #[must_use]
    pub fn supports_verb(&self, verb: Verb) -> bool {
        self.verbs.contains(&verb)
    }

    #[must_use]
    pub fn has_option(&self, option: CollectionOption) -> bool {
        self.options.contains(&option)
    }

    #[must_use]
    pub fn supports_custom_actions(&self) -> bool {
        self.has_option(CollectionOption::CustomActions)
    }

    #[must_use]
    pub fn has_subcollection(&self, name: &str) -> bool {
        self.subcollections.iter().any(|s| s == name)
    }

    /// Actions declared for `target`; empty when none are.
    #[must_use]
    pub fn actions(&self, target: Target) -> &ActionSet {
        static EMPTY: ActionSet = ActionSet {
            by_verb: BTreeMap::new(),
        };
        self.actions.get(&target).unwrap_or(&EMPTY)
    }

    /// Whether a handler named `handler` is implemented, per the `handlers` list.
    #[must_use]
    pub fn implements(&self, handler: &str) -> bool {
        self.handlers
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == handler))
    }

    fn from_config(name: &str, mut cfg: CollectionConfig) -> Result<Self, RegistryError> {
        let verbs: BTreeSet<Verb> = cfg.verbs.iter().copied().collect();
        let mut actions = HashMap::new();
        for (target, declared) in [
            (Target::Collection, std::mem::take(&mut cfg.collection_actions)),
            (Target::Resource, std::mem::take(&mut cfg.resource_actions)),
            (Target::Subcollection, std::mem::take(&mut cfg.subcollection_actions)),
            (Target::Subresource, std::mem::take(&mut cfg.subresource_actions)),
        ] {
            actions.insert(target, build_action_set(name, target, &verbs, declared)?);
        }

        Ok(Self {
            name: name.to_owned(),
            description: cfg.description,
            klass: cfg.klass,
            verbs,
            options: cfg.options.into_iter().collect(),
            identifying_attrs: cfg.identifying_attrs,
            subcollections: cfg.subcollections,
            handlers: cfg.handlers,
            actions,
        })
    }
}

fn build_action_set(
    collection: &str,
    target: Target,
    verbs: &BTreeSet<Verb>,
    declared: BTreeMap<Verb, Vec<ActionSpecConfig>>,
) -> Result<ActionSet, RegistryError> {
    let mut by_verb = BTreeMap::new();
    for (verb, specs) in declared {
        if !verbs.contains(&verb) {
            return Err(RegistryError::UndeclaredVerb {
                collection: collection.to_owned(),
                target,
                verb,
            });
        }
        let mut seen = HashSet::new();
        let mut built = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(RegistryError::EmptyActionName {
                    collection: collection.to_owned(),
                    target,
                    verb,
                });
            }
            if !seen.insert(spec.name.clone()) {
                return Err(RegistryError::DuplicateAction {
                    collection: collection.to_owned(),
                    target,
                    verb,
                    name: spec.name,
                });
            }
            let spec = ActionSpec::from_config(spec);
            if spec.identifiers.iter().any(|id| id.trim().is_empty()) {
                return Err(RegistryError::EmptyIdentifier {
                    collection: collection.to_owned(),
                    action: spec.name,
                });
            }
            built.push(spec);
        }
        by_verb.insert(verb, built);
    }
    Ok(ActionSet { by_verb })
}

/// Read-only map of collection name to [`CollectionEntry`].
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    entries: HashMap<String, CollectionEntry>,
    supported_versions: Vec<String>,
}

impl CollectionRegistry {
    /// Build and validate the registry.
    ///
    /// # Errors
    ///
    /// The first malformed entry found, see [`RegistryError`]. Backing types
    /// are only checked when the configuration declares any.
    pub fn from_config(config: &ResourceAccessConfig) -> Result<Self, RegistryError> {
        if let Some(version) = config
            .supported_versions
            .iter()
            .find(|v| !is_version_tag(v))
        {
            return Err(RegistryError::InvalidVersion {
                version: version.clone(),
            });
        }

        for (name, cfg) in &config.collections {
            if let Some(sub) = cfg
                .subcollections
                .iter()
                .find(|sub| !config.collections.contains_key(*sub))
            {
                return Err(RegistryError::UnknownSubcollection {
                    collection: name.clone(),
                    subcollection: sub.clone(),
                });
            }
            if !config.types.is_empty()
                && let Some(klass) = &cfg.klass
                && !config.types.contains_key(klass)
            {
                return Err(RegistryError::UnknownType {
                    collection: name.clone(),
                    klass: klass.clone(),
                });
            }
        }

        let mut entries = HashMap::with_capacity(config.collections.len());
        for (name, cfg) in &config.collections {
            entries.insert(name.clone(), CollectionEntry::from_config(name, cfg.clone())?);
        }

        debug!(
            collections = entries.len(),
            versions = config.supported_versions.len(),
            "collection registry loaded"
        );

        Ok(Self {
            entries,
            supported_versions: config.supported_versions.clone(),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether requests may carry `version`. An empty list accepts any version.
    #[must_use]
    pub fn supports_version(&self, version: &str) -> bool {
        self.supported_versions.is_empty() || self.supported_versions.iter().any(|v| v == version)
    }

    #[must_use]
    pub fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn load(yaml: &str) -> Result<CollectionRegistry, RegistryError> {
        CollectionRegistry::from_config(&ResourceAccessConfig::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn builds_typed_entries() {
        let registry = load(
            r"
supported_versions: [v1, v2.1]
collections:
  vms:
    verbs: [get, post]
    options: [collection, custom_actions]
    subcollections: [tags]
    resource_actions:
      post:
        - name: start
          identifier: [vm_start, vm_admin]
          validate: validate_start
  tags:
    verbs: [get]
    options: [subcollection]
",
        )
        .unwrap();

        let vms = registry.get("vms").unwrap();
        assert!(vms.supports_verb(Verb::Post));
        assert!(!vms.supports_verb(Verb::Delete));
        assert!(vms.supports_custom_actions());
        assert!(vms.has_subcollection("tags"));
        let start = vms.actions(Target::Resource).find(Verb::Post, "start").unwrap();
        assert_eq!(start.identifiers, ["vm_start", "vm_admin"]);
        assert_eq!(start.validate.as_deref(), Some("validate_start"));
        assert!(vms.actions(Target::Collection).is_empty());
        assert!(registry.supports_version("v2.1"));
        assert!(!registry.supports_version("v3"));
    }

    #[test]
    fn granted_identifier_is_any_match() {
        let spec = ActionSpec {
            name: "start".into(),
            identifiers: vec!["a".into(), "b".into()],
            disabled: false,
            validate: None,
        };
        assert_eq!(spec.granted_identifier(|id| id == "b"), Ok(Some("b")));
        assert!(spec.granted_identifier(|_| false).is_err());

        let open = ActionSpec {
            identifiers: Vec::new(),
            ..spec
        };
        assert_eq!(open.granted_identifier(|_| false), Ok(None));
    }

    #[test]
    fn rejects_unknown_subcollection() {
        let err = load("collections: { vms: { subcollections: [tags] } }").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSubcollection { .. }));
    }

    #[test]
    fn rejects_unknown_type_only_when_types_are_declared() {
        assert!(load("collections: { vms: { klass: Vm } }").is_ok());
        let err = load("types: { Host: {} }\ncollections: { vms: { klass: Vm } }").unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownType {
                collection: "vms".into(),
                klass: "Vm".into()
            }
        );
    }

    #[test]
    fn rejects_duplicate_and_unnamed_actions() {
        let dup = load(
            r"
collections:
  vms: { verbs: [post], collection_actions: { post: [ { name: a }, { name: a } ] } }
",
        )
        .unwrap_err();
        assert!(matches!(dup, RegistryError::DuplicateAction { .. }));

        let unnamed = load(
            r"
collections:
  vms: { verbs: [post], collection_actions: { post: [ { name: '' } ] } }
",
        )
        .unwrap_err();
        assert!(matches!(unnamed, RegistryError::EmptyActionName { .. }));
    }

    #[test]
    fn rejects_actions_for_undeclared_verbs() {
        let err = load(
            r"
collections:
  vms: { verbs: [get], resource_actions: { post: [ { name: a } ] } }
",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::UndeclaredVerb { verb: Verb::Post, .. }));
    }

    #[test]
    fn rejects_empty_identifier_and_bad_version() {
        let err = load(
            r"
collections:
  vms: { verbs: [post], resource_actions: { post: [ { name: a, identifier: '' } ] } }
",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyIdentifier { .. }));

        let err = load("supported_versions: [latest]").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidVersion { .. }));
    }
}
