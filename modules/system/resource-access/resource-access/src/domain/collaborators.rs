//! Static collaborators for development and testing.

use std::collections::HashSet;

use resource_access_sdk::{IdentityResolver, PermissionEvaluator};
use serde_json::Value;

/// Identifier granting every permission.
pub const WILDCARD: &str = "*";

/// [`PermissionEvaluator`] over a fixed set of granted identifiers.
///
/// Granting [`WILDCARD`] allows every identifier.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    granted: HashSet<String>,
}

impl StaticPermissions {
    #[must_use]
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn allow_all() -> Self {
        Self::new([WILDCARD])
    }

    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }
}

impl PermissionEvaluator for StaticPermissions {
    fn allows(&self, identifier: &str) -> bool {
        self.granted.contains(WILDCARD) || self.granted.contains(identifier)
    }
}

/// [`IdentityResolver`] that never finds a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentityLookup;

impl IdentityResolver for NoIdentityLookup {
    fn find_id(&self, _collection: &str, _attribute: &str, _value: &Value) -> Option<String> {
        None
    }
}
