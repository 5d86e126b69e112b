//! Collaborator traits consumed by the resource access layer.
//!
//! Implementations live outside this layer (schema metadata, authorization,
//! id encoding, record lookup). Every method is synchronous and side-effect
//! free from the caller's point of view.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of an attribute, as far as filter compilation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Integer,
    Datetime,
    Date,
    Boolean,
    /// Multi-valued string attribute (tags and similar).
    StringSet,
}

impl AttributeType {
    /// Date and datetime attributes only accept `<`, `>` and `=`.
    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Datetime | Self::Date)
    }
}

/// Read-only access to type metadata.
pub trait SchemaInspector: Send + Sync {
    /// Whether `name` is a physical attribute of `type_name`.
    fn has_attribute(&self, type_name: &str, name: &str) -> bool;

    /// Whether `name` is a virtual (computed) attribute of `type_name`.
    fn is_virtual(&self, type_name: &str, name: &str) -> bool;

    /// Declared type of a physical or virtual attribute.
    fn attribute_type(&self, type_name: &str, name: &str) -> Option<AttributeType>;

    /// Type reached through `association`, if `type_name` has one by that name.
    fn associated_type(&self, type_name: &str, association: &str) -> Option<String>;

    /// Physical or virtual.
    fn is_real_attribute(&self, type_name: &str, name: &str) -> bool {
        self.has_attribute(type_name, name) || self.is_virtual(type_name, name)
    }
}

/// Yes/no permission predicate for the current actor.
pub trait PermissionEvaluator: Send + Sync {
    fn allows(&self, identifier: &str) -> bool;
}

/// Compressed-id codec.
pub trait IdDecoder: Send + Sync {
    /// Whether `token` is in the compressed form.
    fn is_encoded(&self, token: &str) -> bool;

    /// Canonical numeric form of a compressed token.
    fn decode(&self, token: &str) -> String;
}

/// Lookup of a record id by one of its identifying attributes.
pub trait IdentityResolver: Send + Sync {
    /// Id of the unique record in `collection` whose `attribute` equals `value`.
    fn find_id(&self, collection: &str, attribute: &str, value: &Value) -> Option<String>;
}
