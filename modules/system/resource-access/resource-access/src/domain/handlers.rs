//! Explicit `(collection, subcollection, target, action) -> handler` table.

use std::collections::HashMap;

use resource_access_sdk::Target;
use tracing::debug;

use super::registry::CollectionRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HandlerKey {
    collection: String,
    subcollection: Option<String>,
    target: Target,
    action: String,
}

/// Handler names keyed by the primary collection, subcollection, target kind and action.
///
/// Subcollection handlers are keyed under the parent collection and the
/// subcollection name; sibling subcollections never share an entry.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<HandlerKey, String>,
}

impl HandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventional handler name for `action` on `target`.
    ///
    /// `{action}_resource` for primary targets, `{subcollection}_{action}_resource`
    /// for subcollection targets.
    #[must_use]
    pub fn conventional_name(subcollection: Option<&str>, action: &str) -> String {
        match subcollection {
            Some(sub) => format!("{sub}_{action}_resource"),
            None => format!("{action}_resource"),
        }
    }

    /// Populate the table with the conventional handler of every declared action.
    ///
    /// When a collection lists its `handlers`, only those are registered.
    #[must_use]
    pub fn from_registry(registry: &CollectionRegistry) -> Self {
        let mut table = Self::new();
        for entry in registry.entries() {
            for target in [Target::Collection, Target::Resource] {
                for (_, spec) in entry.actions(target).declared() {
                    let handler = Self::conventional_name(None, &spec.name);
                    if entry.implements(&handler) {
                        table.register(&entry.name, None, target, &spec.name, handler);
                    }
                }
            }

            for sub in &entry.subcollections {
                let Some(sub_entry) = registry.get(sub) else {
                    continue;
                };
                for target in [Target::Subcollection, Target::Subresource] {
                    for (_, spec) in sub_entry.actions(target).declared() {
                        let handler = Self::conventional_name(Some(sub), &spec.name);
                        if entry.implements(&handler) {
                            table.register(&entry.name, Some(sub), target, &spec.name, handler);
                        }
                    }
                }
            }
        }
        debug!(handlers = table.len(), "handler table built");
        table
    }

    /// Register (or replace) the handler for `(collection, subcollection, target, action)`.
    pub fn register(
        &mut self,
        collection: &str,
        subcollection: Option<&str>,
        target: Target,
        action: &str,
        handler: impl Into<String>,
    ) {
        self.handlers.insert(
            HandlerKey {
                collection: collection.to_owned(),
                subcollection: subcollection.map(ToOwned::to_owned),
                target,
                action: action.to_owned(),
            },
            handler.into(),
        );
    }

    #[must_use]
    pub fn lookup(
        &self,
        collection: &str,
        subcollection: Option<&str>,
        target: Target,
        action: &str,
    ) -> Option<&str> {
        self.handlers
            .get(&HandlerKey {
                collection: collection.to_owned(),
                subcollection: subcollection.map(ToOwned::to_owned),
                target,
                action: action.to_owned(),
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::ResourceAccessConfig;

    fn registry(yaml: &str) -> CollectionRegistry {
        CollectionRegistry::from_config(&ResourceAccessConfig::from_yaml_str(yaml).unwrap())
            .unwrap()
    }

    #[test]
    fn registers_conventional_names() {
        let registry = registry(
            r"
collections:
  vms:
    verbs: [get, post]
    subcollections: [tags]
    collection_actions:
      get: [ { name: read } ]
    resource_actions:
      post: [ { name: start } ]
  tags:
    verbs: [get, post]
    subcollection_actions:
      post: [ { name: assign } ]
    subresource_actions:
      get: [ { name: read } ]
",
        );
        let table = HandlerTable::from_registry(&registry);
        assert_eq!(table.lookup("vms", None, Target::Collection, "read"), Some("read_resource"));
        assert_eq!(table.lookup("vms", None, Target::Resource, "start"), Some("start_resource"));
        assert_eq!(
            table.lookup("vms", Some("tags"), Target::Subcollection, "assign"),
            Some("tags_assign_resource")
        );
        assert_eq!(
            table.lookup("vms", Some("tags"), Target::Subresource, "read"),
            Some("tags_read_resource")
        );
        assert_eq!(table.lookup("vms", None, Target::Resource, "stop"), None);
        assert_eq!(table.lookup("tags", None, Target::Subcollection, "assign"), None);
    }

    #[test]
    fn handlers_list_restricts_registration() {
        let registry = registry(
            r"
collections:
  vms:
    verbs: [post]
    handlers: [start_resource]
    resource_actions:
      post: [ { name: start }, { name: reboot } ]
",
        );
        let table = HandlerTable::from_registry(&registry);
        assert_eq!(table.len(), 1);
        assert!(table.lookup("vms", None, Target::Resource, "reboot").is_none());
    }

    #[test]
    fn manual_registration_overrides() {
        let mut table = HandlerTable::new();
        table.register("vms", None, Target::Resource, "start", "power_on");
        assert_eq!(table.lookup("vms", None, Target::Resource, "start"), Some("power_on"));
    }

    #[test]
    fn sibling_subcollections_keep_their_own_handlers() {
        let registry = registry(
            r"
collections:
  vms:
    verbs: [get]
    subcollections: [tags, snapshots]
  tags:
    verbs: [get]
    subcollection_actions:
      get: [ { name: read } ]
  snapshots:
    verbs: [get]
    subcollection_actions:
      get: [ { name: read } ]
",
        );
        let table = HandlerTable::from_registry(&registry);
        assert_eq!(
            table.lookup("vms", Some("tags"), Target::Subcollection, "read"),
            Some("tags_read_resource")
        );
        assert_eq!(
            table.lookup("vms", Some("snapshots"), Target::Subcollection, "read"),
            Some("snapshots_read_resource")
        );
        assert_eq!(table.lookup("vms", None, Target::Subcollection, "read"), None);
    }
}
