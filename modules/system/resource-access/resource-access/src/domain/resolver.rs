//! Verb + address + explicit action to operation descriptor.

use std::sync::Arc;

use resource_access_sdk::{
    AccessError, OperationDescriptor, PermissionEvaluator, ResourceAddress, TargetShape, Verb,
};
use tracing::{debug, warn};

use super::handlers::HandlerTable;
use super::registry::{CollectionEntry, CollectionRegistry};
use crate::config::CollectionOption;

/// Handler serving the API entrypoint.
pub const ENTRYPOINT_HANDLER: &str = "entrypoint";
/// Handler answering OPTIONS on any known collection.
pub const OPTIONS_HANDLER: &str = "options";
/// Generic handler for declared actions without a dedicated one.
pub const CUSTOM_ACTION_HANDLER: &str = "custom_action_resource";

/// Canonical action name of a request.
///
/// The explicit action (from the request body) only applies to POST.
#[must_use]
pub fn action_name(verb: Verb, explicit: Option<&str>) -> String {
    match verb {
        Verb::Get => "read".to_owned(),
        Verb::Put | Verb::Patch => "edit".to_owned(),
        Verb::Delete => "delete".to_owned(),
        Verb::Options => "options".to_owned(),
        Verb::Post => explicit
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("create")
            .to_owned(),
    }
}

/// Collection entries involved in a request.
struct Resolved<'a> {
    primary: &'a CollectionEntry,
    target: &'a CollectionEntry,
}

/// Resolves requests against the collection registry.
#[derive(Debug, Clone)]
pub struct ActionResolver {
    registry: Arc<CollectionRegistry>,
    handlers: HandlerTable,
}

impl ActionResolver {
    /// Resolver using the conventional handler of every declared action.
    #[must_use]
    pub fn new(registry: Arc<CollectionRegistry>) -> Self {
        let handlers = HandlerTable::from_registry(&registry);
        Self { registry, handlers }
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Resolve a request to exactly one handler.
    ///
    /// The returned descriptor carries the single id of `address`, if any;
    /// bulk targets are filled in by the shape classifier.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAction` for an unknown collection or subcollection, a
    ///   verb the target does not accept, an action not declared for the
    ///   target shape, or a missing handler
    /// - `Forbidden` when the action is disabled or no declared permission
    ///   identifier is granted
    pub fn resolve(
        &self,
        verb: Verb,
        address: &ResourceAddress,
        explicit_action: Option<&str>,
        permissions: &dyn PermissionEvaluator,
    ) -> Result<OperationDescriptor, AccessError> {
        let shape = address.shape();
        let action = action_name(verb, explicit_action);

        let Some(collection) = address.collection.as_deref() else {
            return Self::resolve_entrypoint(verb, action);
        };
        let entries = self.entries(collection, address)?;

        if verb == Verb::Options {
            return Ok(descriptor(OPTIONS_HANDLER, action, address, shape));
        }

        if !entries.target.supports_verb(verb) {
            warn!(collection, verb = %verb, "verb not supported");
            return Err(AccessError::unsupported_action(format!(
                "Unsupported HTTP verb {verb} for {}",
                entries.target.name
            )));
        }

        let Some(spec) = entries.target.actions(shape.target).find(verb, &action) else {
            warn!(collection, action = %action, shape = %shape, "action not declared");
            return Err(AccessError::unsupported_action(format!(
                "Unsupported action {action} for {} {shape}",
                entries.target.name
            )));
        };

        if spec.disabled {
            warn!(collection, action = %action, "action disabled");
            return Err(AccessError::forbidden(format!(
                "Action {action} for {} is disabled",
                entries.target.name
            )));
        }

        let permission = match spec.granted_identifier(|id| permissions.allows(id)) {
            Ok(granted) => granted.map(ToOwned::to_owned),
            Err(declared) => {
                warn!(collection, action = %action, identifiers = ?declared, "permission denied");
                return Err(AccessError::forbidden(format!(
                    "Use of the {action} action for {} is forbidden",
                    entries.target.name
                )));
            }
        };

        let handler =
            self.handler_for(entries.primary, address.subcollection.as_deref(), shape, &action)?;
        debug!(collection, action = %action, handler = %handler, shape = %shape, "action resolved");

        let mut resolved = descriptor(handler, action, address, shape);
        resolved.permission_identifier = permission;
        resolved.validation_hook.clone_from(&spec.validate);
        Ok(resolved)
    }

    fn resolve_entrypoint(verb: Verb, action: String) -> Result<OperationDescriptor, AccessError> {
        if !matches!(verb, Verb::Get | Verb::Options) {
            return Err(AccessError::unsupported_action(format!(
                "Unsupported HTTP verb {verb} for the API entrypoint"
            )));
        }
        let handler = if verb == Verb::Options {
            OPTIONS_HANDLER
        } else {
            ENTRYPOINT_HANDLER
        };
        Ok(descriptor(
            handler,
            action,
            &ResourceAddress::default(),
            TargetShape::COLLECTION,
        ))
    }

    fn entries(
        &self,
        collection: &str,
        address: &ResourceAddress,
    ) -> Result<Resolved<'_>, AccessError> {
        let Some(primary) = self.registry.get(collection) else {
            warn!(collection, "unknown collection");
            return Err(AccessError::unsupported_action(format!(
                "Unsupported collection {collection} specified"
            )));
        };

        let Some(sub) = address.subcollection.as_deref() else {
            if primary.has_option(CollectionOption::Subcollection)
                && !primary.has_option(CollectionOption::Collection)
            {
                return Err(AccessError::unsupported_action(format!(
                    "Collection {collection} is only available as a subcollection"
                )));
            }
            return Ok(Resolved {
                primary,
                target: primary,
            });
        };

        match self.registry.get(sub) {
            Some(target) if primary.has_subcollection(sub) => Ok(Resolved { primary, target }),
            _ => {
                warn!(collection, subcollection = sub, "unknown subcollection");
                Err(AccessError::unsupported_action(format!(
                    "Unsupported subcollection {sub} specified for {collection}"
                )))
            }
        }
    }

    fn handler_for(
        &self,
        primary: &CollectionEntry,
        subcollection: Option<&str>,
        shape: TargetShape,
        action: &str,
    ) -> Result<String, AccessError> {
        if let Some(handler) = self
            .handlers
            .lookup(&primary.name, subcollection, shape.target, action)
        {
            return Ok(handler.to_owned());
        }
        if !shape.is_subcollection() && primary.supports_custom_actions() {
            return Ok(CUSTOM_ACTION_HANDLER.to_owned());
        }
        warn!(collection = %primary.name, action, shape = %shape, "no handler registered");
        Err(AccessError::unsupported_action(format!(
            "No handler for {action} on {} {shape}",
            primary.name
        )))
    }
}

fn descriptor(
    handler: impl Into<String>,
    action: String,
    address: &ResourceAddress,
    shape: TargetShape,
) -> OperationDescriptor {
    OperationDescriptor {
        handler_name: handler.into(),
        action_name: action,
        collection: address.collection.clone(),
        shape,
        is_bulk: false,
        target_ids: address.target_id().map(ToOwned::to_owned).into_iter().collect(),
        failures: Vec::new(),
        new_resources: 0,
        permission_identifier: None,
        validation_hook: None,
        filter: None,
        attributes: Vec::new(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn action_names_follow_verbs() {
        assert_eq!(action_name(Verb::Get, Some("start")), "read");
        assert_eq!(action_name(Verb::Put, None), "edit");
        assert_eq!(action_name(Verb::Patch, None), "edit");
        assert_eq!(action_name(Verb::Delete, None), "delete");
        assert_eq!(action_name(Verb::Options, None), "options");
        assert_eq!(action_name(Verb::Post, None), "create");
        assert_eq!(action_name(Verb::Post, Some("  ")), "create");
        assert_eq!(action_name(Verb::Post, Some("start")), "start");
    }

    #[test]
    fn entrypoint_accepts_get_and_options_only() {
        let resolver = ActionResolver::new(Arc::new(CollectionRegistry::default()));
        let perms = crate::domain::collaborators::StaticPermissions::deny_all();
        let root = ResourceAddress::default();

        let get = resolver.resolve(Verb::Get, &root, None, &perms).unwrap();
        assert_eq!(get.handler_name, ENTRYPOINT_HANDLER);
        assert_eq!(get.collection, None);

        let options = resolver.resolve(Verb::Options, &root, None, &perms).unwrap();
        assert_eq!(options.handler_name, OPTIONS_HANDLER);

        let err = resolver.resolve(Verb::Post, &root, None, &perms).unwrap_err();
        assert!(matches!(err, AccessError::UnsupportedAction { .. }));
    }

    #[test]
    fn unknown_collection_fails_closed() {
        let resolver = ActionResolver::new(Arc::new(CollectionRegistry::default()));
        let perms = crate::domain::collaborators::StaticPermissions::allow_all();
        let err = resolver
            .resolve(Verb::Get, &ResourceAddress::collection("vms"), None, &perms)
            .unwrap_err();
        assert!(err.message().contains("Unsupported collection vms"));
    }
}
