//! Bulk vs single request classification and per-element id resolution.

use std::sync::Arc;

use resource_access_sdk::{AccessError, ElementFailure, IdentityResolver, ResourceAddress, Verb};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::id_codec::is_numeric_id;
use super::locator::ResourceLocator;

/// Body key carrying bulk elements.
pub const RESOURCES_KEY: &str = "resources";

/// Actions that create records and therefore must not carry identifiers.
const CREATION_ACTIONS: &[&str] = &["create", "add"];

#[must_use]
pub fn is_creation_action(action: &str) -> bool {
    CREATION_ACTIONS.contains(&action)
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestShape {
    pub is_bulk: bool,
    /// Resolved ids, in element order.
    pub target_ids: Vec<String>,
    /// Elements dropped during resolution; siblings are unaffected.
    pub failures: Vec<ElementFailure>,
    /// Creation elements, which carry no id.
    pub new_resources: usize,
}

/// Classifies requests and normalizes element identifiers to canonical ids.
#[derive(Clone)]
pub struct ShapeClassifier {
    locator: ResourceLocator,
    identity: Arc<dyn IdentityResolver>,
}

impl std::fmt::Debug for ShapeClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeClassifier")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl ShapeClassifier {
    #[must_use]
    pub fn new(locator: ResourceLocator, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { locator, identity }
    }

    /// Classify a request and resolve its target ids.
    ///
    /// DELETE requests and bodies without `resources` are single-shape and
    /// target the id of `address`, if any. Otherwise every element of
    /// `resources` is resolved independently: href, then `id`, then the
    /// first present identifying attribute.
    ///
    /// # Errors
    ///
    /// `BadRequest` when a single-shape creation body carries an id or href,
    /// or when `resources` is not an array. Per-element problems are recorded
    /// in [`RequestShape::failures`] instead.
    pub fn classify(
        &self,
        verb: Verb,
        address: &ResourceAddress,
        action: &str,
        body: Option<&Value>,
        identifying_attrs: &[String],
    ) -> Result<RequestShape, AccessError> {
        let creating = is_creation_action(action);
        let resources = body.and_then(|b| b.get(RESOURCES_KEY));

        let Some(resources) = resources.filter(|_| verb != Verb::Delete) else {
            if creating
                && let Some(Value::Object(fields)) = body
                && carries_identifier(fields)
            {
                return Err(AccessError::bad_request(format!(
                    "Resource id or href should not be specified for creating a new {}",
                    target_label(address)
                )));
            }
            return Ok(RequestShape {
                is_bulk: false,
                target_ids: address.target_id().map(ToOwned::to_owned).into_iter().collect(),
                ..RequestShape::default()
            });
        };

        let Value::Array(elements) = resources else {
            return Err(AccessError::bad_request(format!(
                "Invalid {RESOURCES_KEY} specified, expected an array"
            )));
        };

        let mut shape = RequestShape {
            is_bulk: true,
            ..RequestShape::default()
        };
        for (index, element) in elements.iter().enumerate() {
            let outcome = match element {
                Value::Object(fields) if creating => {
                    if carries_identifier(fields) {
                        Err(AccessError::bad_request(format!(
                            "Resource id or href should not be specified for creating a new {}",
                            target_label(address)
                        )))
                    } else {
                        shape.new_resources += 1;
                        continue;
                    }
                }
                Value::Object(fields) => self.resolve_element(address, fields, identifying_attrs),
                _ => Err(AccessError::bad_request(format!(
                    "Invalid resource specified at index {index}, expected an object"
                ))),
            };
            match outcome {
                Ok(id) => shape.target_ids.push(id),
                Err(error) => {
                    warn!(index, error = %error, "bulk element dropped");
                    shape.failures.push(ElementFailure { index, error });
                }
            }
        }

        debug!(
            resolved = shape.target_ids.len(),
            failed = shape.failures.len(),
            created = shape.new_resources,
            "bulk request classified"
        );
        Ok(shape)
    }

    fn resolve_element(
        &self,
        address: &ResourceAddress,
        fields: &Map<String, Value>,
        identifying_attrs: &[String],
    ) -> Result<String, AccessError> {
        if let Some(href) = fields.get("href").and_then(Value::as_str)
            && let Some(id) = self.href_id(address, href)
        {
            return Ok(id);
        }

        if let Some(raw) = fields.get("id") {
            return self.explicit_id(raw);
        }

        let collection = address.target_collection().unwrap_or_default();
        for attr in identifying_attrs {
            if let Some(value) = fields.get(attr).filter(|v| !v.is_null()) {
                return self
                    .identity
                    .find_id(collection, attr, value)
                    .ok_or_else(|| {
                        AccessError::not_found(format!(
                            "Couldn't find {collection} with {attr}={value}"
                        ))
                    });
            }
        }

        Err(AccessError::bad_request(format!(
            "Resource id, href or identifying attribute must be specified for {collection}"
        )))
    }

    /// Id of `href` when it addresses a member of the request's target collection.
    fn href_id(&self, address: &ResourceAddress, href: &str) -> Option<String> {
        let parsed = self.locator.parse(href);
        if parsed.target_collection() != address.target_collection() {
            return None;
        }
        if address.subcollection.is_some()
            && parsed.subcollection.is_some()
            && parsed.collection_id != address.collection_id
        {
            return None;
        }
        parsed
            .target_id()
            .filter(|id| is_numeric_id(id))
            .map(ToOwned::to_owned)
    }

    fn explicit_id(&self, raw: &Value) -> Result<String, AccessError> {
        let id = match raw {
            Value::Number(n) if n.is_u64() => n.to_string(),
            Value::String(s) => self.locator.decode_id(s.trim()),
            _ => String::new(),
        };
        if is_numeric_id(&id) {
            Ok(id)
        } else {
            Err(AccessError::bad_request(format!("Invalid resource id {raw}")))
        }
    }
}

fn carries_identifier(fields: &Map<String, Value>) -> bool {
    ["id", "href"]
        .iter()
        .any(|key| fields.get(*key).is_some_and(|v| !v.is_null()))
}

fn target_label(address: &ResourceAddress) -> &str {
    address.target_collection().unwrap_or("resource")
}
