//! Configuration-backed schema inspector.

use std::collections::BTreeMap;

use resource_access_sdk::{AttributeType, SchemaInspector};

use crate::config::TypeSchemaConfig;

/// [`SchemaInspector`] over a fixed set of type descriptions.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    types: BTreeMap<String, TypeSchemaConfig>,
}

impl StaticSchema {
    #[must_use]
    pub fn new(types: BTreeMap<String, TypeSchemaConfig>) -> Self {
        Self { types }
    }

    /// Add or replace one type description.
    #[must_use]
    pub fn with_type(mut self, name: impl Into<String>, schema: TypeSchemaConfig) -> Self {
        self.types.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl SchemaInspector for StaticSchema {
    fn has_attribute(&self, type_name: &str, name: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|t| t.attributes.contains_key(name))
    }

    fn is_virtual(&self, type_name: &str, name: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|t| t.virtual_attributes.contains_key(name))
    }

    fn attribute_type(&self, type_name: &str, name: &str) -> Option<AttributeType> {
        let t = self.types.get(type_name)?;
        t.attributes
            .get(name)
            .or_else(|| t.virtual_attributes.get(name))
            .copied()
    }

    fn associated_type(&self, type_name: &str, association: &str) -> Option<String> {
        self.types
            .get(type_name)?
            .associations
            .get(association)
            .cloned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn schema() -> StaticSchema {
        let mut vm = TypeSchemaConfig::default();
        vm.attributes.insert("name".into(), AttributeType::String);
        vm.virtual_attributes
            .insert("archived".into(), AttributeType::Boolean);
        vm.associations.insert("host".into(), "Host".into());
        StaticSchema::default().with_type("Vm", vm)
    }

    #[test]
    fn physical_and_virtual_attributes() {
        let s = schema();
        assert!(s.has_attribute("Vm", "name"));
        assert!(!s.has_attribute("Vm", "archived"));
        assert!(s.is_virtual("Vm", "archived"));
        assert!(s.is_real_attribute("Vm", "archived"));
        assert_eq!(s.attribute_type("Vm", "archived"), Some(AttributeType::Boolean));
        assert!(!s.is_real_attribute("Host", "name"));
    }

    #[test]
    fn associations_resolve_to_type_names() {
        let s = schema();
        assert_eq!(s.associated_type("Vm", "host").as_deref(), Some("Host"));
        assert_eq!(s.associated_type("Vm", "storage"), None);
        assert_eq!(s.associated_type("Nope", "host"), None);
    }
}
