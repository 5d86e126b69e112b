//! Request pipeline: one [`ApiRequest`] in, one operation descriptor out.

use std::sync::Arc;

use resource_access_sdk::{
    AccessError, IdDecoder, IdentityResolver, OperationDescriptor, PermissionEvaluator,
    ResourceAddress, SchemaInspector, Verb,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::ResourceAccessConfig;
use crate::domain::collaborators::NoIdentityLookup;
use crate::domain::filter::{FilterCompiler, FilterPriority};
use crate::domain::id_codec::CompressedIdDecoder;
use crate::domain::locator::ResourceLocator;
use crate::domain::registry::{CollectionEntry, CollectionRegistry, RegistryError};
use crate::domain::resolver::{ActionResolver, action_name};
use crate::domain::schema::StaticSchema;
use crate::domain::shape::ShapeClassifier;

/// Body key naming an explicit action on POST.
pub const ACTION_KEY: &str = "action";

/// Transport-neutral view of one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub verb: Verb,
    /// Href of the target, absolute or relative.
    pub path: String,
    pub body: Option<Value>,
    /// Filter clauses, in order.
    pub filters: Vec<String>,
    /// Requested attribute selection.
    pub attributes: Vec<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            body: None,
            filters: Vec::new(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, clause: impl Into<String>) -> Self {
        self.filters.push(clause.into());
        self
    }

    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Explicit action named in the body, if any.
    #[must_use]
    pub fn explicit_action(&self) -> Option<&str> {
        self.body.as_ref()?.get(ACTION_KEY)?.as_str()
    }
}

/// Locate, resolve, classify and compile a request into an [`OperationDescriptor`].
#[derive(Clone)]
pub struct ResourceAccessService {
    registry: Arc<CollectionRegistry>,
    locator: ResourceLocator,
    resolver: ActionResolver,
    classifier: ShapeClassifier,
    schema: Arc<dyn SchemaInspector>,
    identity: Arc<dyn IdentityResolver>,
    priority: FilterPriority,
}

impl std::fmt::Debug for ResourceAccessService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceAccessService")
            .field("collections", &self.registry.len())
            .field("locator", &self.locator)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl ResourceAccessService {
    /// Service with the static schema from `config`, the compressed-id
    /// decoder and no identity lookup.
    ///
    /// # Errors
    ///
    /// See [`CollectionRegistry::from_config`].
    pub fn from_config(config: &ResourceAccessConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(CollectionRegistry::from_config(config)?);
        let locator =
            ResourceLocator::new(&config.api_prefix, Arc::new(CompressedIdDecoder::new()));
        let identity: Arc<dyn IdentityResolver> = Arc::new(NoIdentityLookup);

        info!(
            collections = registry.len(),
            prefix = locator.prefix(),
            "resource access service initialized"
        );

        Ok(Self {
            resolver: ActionResolver::new(Arc::clone(&registry)),
            classifier: ShapeClassifier::new(locator.clone(), Arc::clone(&identity)),
            schema: Arc::new(StaticSchema::new(config.types.clone())),
            registry,
            locator,
            identity,
            priority: config.filter_priority,
        })
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Arc<dyn SchemaInspector>) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn IdDecoder>) -> Self {
        self.locator = ResourceLocator::new(self.locator.prefix(), decoder);
        self.classifier = ShapeClassifier::new(self.locator.clone(), Arc::clone(&self.identity));
        self
    }

    #[must_use]
    pub fn with_identity_resolver(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.classifier = ShapeClassifier::new(self.locator.clone(), Arc::clone(&identity));
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: ActionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    #[must_use]
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Run the full pipeline for one request: locate, classify, resolve, compile.
    ///
    /// # Errors
    ///
    /// - `BadRequest` for an unsupported version, a malformed body, an
    ///   attribute selection the target type does not have, or filters on a
    ///   collection without a backing type
    /// - `UnsupportedAction` / `Forbidden` from action resolution
    /// - `InvalidFilter` from filter compilation
    #[instrument(skip_all, fields(verb = %request.verb, path = %request.path))]
    pub fn prepare(
        &self,
        request: &ApiRequest,
        permissions: &dyn PermissionEvaluator,
    ) -> Result<OperationDescriptor, AccessError> {
        let address = self.locator.parse(&request.path);
        if let Some(version) = address.version.as_deref()
            && !self.registry.supports_version(version)
        {
            return Err(AccessError::bad_request(format!(
                "Unsupported API version {version} specified"
            )));
        }

        let explicit = request.explicit_action();
        let target = self.target_entry(&address);
        let identifying_attrs = target.map_or(&[][..], |e| e.identifying_attrs.as_slice());
        let shape = self.classifier.classify(
            request.verb,
            &address,
            &action_name(request.verb, explicit),
            request.body.as_ref(),
            identifying_attrs,
        )?;

        let mut descriptor = self
            .resolver
            .resolve(request.verb, &address, explicit, permissions)?;

        if !request.filters.is_empty() {
            let klass = backing_type(target, &address, "filtering")?;
            let compiler = FilterCompiler::new(self.schema.as_ref()).with_priority(self.priority);
            descriptor.filter = Some(compiler.compile(klass, &request.filters)?);
        }

        if !request.attributes.is_empty() {
            let klass = backing_type(target, &address, "attribute selection")?;
            self.validate_attributes(klass, &request.attributes)?;
            descriptor.attributes.clone_from(&request.attributes);
        }

        descriptor.is_bulk = shape.is_bulk;
        descriptor.target_ids = shape.target_ids;
        descriptor.failures = shape.failures;
        descriptor.new_resources = shape.new_resources;

        debug!(
            handler = %descriptor.handler_name,
            bulk = descriptor.is_bulk,
            targets = descriptor.target_ids.len(),
            "request prepared"
        );
        Ok(descriptor)
    }

    fn target_entry(&self, address: &ResourceAddress) -> Option<&CollectionEntry> {
        self.registry.get(address.target_collection()?)
    }

    fn validate_attributes(&self, klass: &str, attributes: &[String]) -> Result<(), AccessError> {
        let invalid: Vec<&str> = attributes
            .iter()
            .map(String::as_str)
            .filter(|a| {
                !self.schema.is_real_attribute(klass, a)
                    && self.schema.associated_type(klass, a).is_none()
            })
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(AccessError::bad_request(format!(
                "Invalid attributes specified: {}",
                invalid.join(", ")
            )))
        }
    }
}

fn backing_type<'a>(
    entry: Option<&'a CollectionEntry>,
    address: &ResourceAddress,
    purpose: &str,
) -> Result<&'a str, AccessError> {
    entry.and_then(|e| e.klass.as_deref()).ok_or_else(|| {
        AccessError::bad_request(format!(
            "{} does not support {purpose}",
            address.target_collection().unwrap_or("The API entrypoint")
        ))
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explicit_action_comes_from_the_body() {
        let req = ApiRequest::new(Verb::Post, "/api/vms/1").with_body(json!({"action": "start"}));
        assert_eq!(req.explicit_action(), Some("start"));
        assert_eq!(ApiRequest::new(Verb::Post, "/api/vms").explicit_action(), None);
        let numeric = ApiRequest::new(Verb::Post, "/api/vms").with_body(json!({"action": 1}));
        assert_eq!(numeric.explicit_action(), None);
    }

    #[test]
    fn builder_accumulates_filters_and_attributes() {
        let req = ApiRequest::new(Verb::Get, "vms")
            .with_filter("name='a'")
            .with_filter("or id > 3")
            .with_attributes(["name", "id"]);
        assert_eq!(req.filters, ["name='a'", "or id > 3"]);
        assert_eq!(req.attributes, ["name", "id"]);
    }
}
