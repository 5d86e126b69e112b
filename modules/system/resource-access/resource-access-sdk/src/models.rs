//! Models shared between the resource access layer and its callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, ErrorKind};
use crate::expression::Expression;

/// HTTP-style request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    Put,
    Patch,
    Post,
    Delete,
    Options,
}

impl Verb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

impl FromStr for Verb {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "post" => Ok(Self::Post),
            "delete" => Ok(Self::Delete),
            "options" => Ok(Self::Options),
            _ => Err(AccessError::bad_request(format!("Unsupported HTTP verb {s}"))),
        }
    }
}

/// Coordinates of the resource(s) a request operates on.
///
/// `subcollection_id` implies `subcollection`; `collection_id` is absent
/// exactly when the whole collection is addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceAddress {
    pub collection: Option<String>,
    pub collection_id: Option<String>,
    pub subcollection: Option<String>,
    pub subcollection_id: Option<String>,
    pub version: Option<String>,
}

impl ResourceAddress {
    /// Address of a whole collection.
    #[must_use]
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            ..Self::default()
        }
    }

    /// Address of a single resource.
    #[must_use]
    pub fn resource(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: Some(name.into()),
            collection_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Narrow this address to a subcollection, optionally to one of its members.
    #[must_use]
    pub fn with_subcollection(mut self, name: impl Into<String>, id: Option<String>) -> Self {
        self.subcollection = Some(name.into());
        self.subcollection_id = id;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The API entrypoint carries no collection at all.
    #[must_use]
    pub fn is_entrypoint(&self) -> bool {
        self.collection.is_none()
    }

    /// Name of the collection the request ultimately targets.
    #[must_use]
    pub fn target_collection(&self) -> Option<&str> {
        self.subcollection.as_deref().or(self.collection.as_deref())
    }

    /// Identifier of the single record targeted, if the address names one.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        if self.subcollection.is_some() {
            self.subcollection_id.as_deref()
        } else {
            self.collection_id.as_deref()
        }
    }

    /// Shape of the target derived from which segments are present.
    #[must_use]
    pub fn shape(&self) -> TargetShape {
        let subject = if self.collection_id.is_some() {
            Subject::Resource
        } else {
            Subject::Collection
        };
        let target = match (&self.subcollection, &self.subcollection_id) {
            (Some(_), Some(_)) => Target::Subresource,
            (Some(_), None) => Target::Subcollection,
            (None, _) if self.collection_id.is_some() => Target::Resource,
            (None, _) => Target::Collection,
        };
        TargetShape { subject, target }
    }

    /// Canonical href under `prefix` (e.g. `/api`). Parsing it yields `self` back.
    #[must_use]
    pub fn href(&self, prefix: &str) -> String {
        let mut href = prefix.trim_end_matches('/').to_owned();
        let segments = [
            &self.version,
            &self.collection,
            &self.collection_id,
            &self.subcollection,
            &self.subcollection_id,
        ];
        for segment in segments.into_iter().flatten() {
            href.push('/');
            href.push_str(segment);
        }
        href
    }
}

/// Whether the primary side of the address is a collection or one of its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Collection,
    Resource,
}

/// What the request acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Collection,
    Resource,
    Subcollection,
    Subresource,
}

/// `(subject, target)` pair selecting which action set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetShape {
    pub subject: Subject,
    pub target: Target,
}

impl TargetShape {
    pub const COLLECTION: Self = Self {
        subject: Subject::Collection,
        target: Target::Collection,
    };
    pub const RESOURCE: Self = Self {
        subject: Subject::Resource,
        target: Target::Resource,
    };
    pub const SUBCOLLECTION: Self = Self {
        subject: Subject::Resource,
        target: Target::Subcollection,
    };
    pub const SUBRESOURCE: Self = Self {
        subject: Subject::Resource,
        target: Target::Subresource,
    };

    #[must_use]
    pub fn is_subcollection(self) -> bool {
        matches!(self.target, Target::Subcollection | Target::Subresource)
    }

    /// Whether the target is a set of records rather than one record.
    #[must_use]
    pub fn targets_many(self) -> bool {
        matches!(self.target, Target::Collection | Target::Subcollection)
    }
}

impl Subject {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Resource => "resource",
        }
    }
}

impl Target {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Resource => "resource",
            Self::Subcollection => "subcollection",
            Self::Subresource => "subresource",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.subject.as_str(), self.target.as_str())
    }
}

/// A bulk element that could not be turned into a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementFailure {
    /// Position of the element in the `resources` array.
    pub index: usize,
    pub error: AccessError,
}

impl ElementFailure {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Fully resolved operation, handed to the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescriptor {
    pub handler_name: String,
    pub action_name: String,
    pub collection: Option<String>,
    pub shape: TargetShape,
    pub is_bulk: bool,
    /// Resolved ids, in request order.
    pub target_ids: Vec<String>,
    /// Bulk elements dropped during identifier resolution.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ElementFailure>,
    /// Bulk creation elements carrying no identifier.
    #[serde(skip_serializing_if = "is_zero")]
    pub new_resources: usize,
    /// The identifier that granted access, when the action declares any.
    pub permission_identifier: Option<String>,
    /// Validation hook declared on the matched action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_hook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde passes fields by reference
fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn shape_follows_present_segments() {
        assert_eq!(ResourceAddress::collection("vms").shape(), TargetShape::COLLECTION);
        assert_eq!(ResourceAddress::resource("vms", "1").shape(), TargetShape::RESOURCE);
        assert_eq!(
            ResourceAddress::resource("vms", "1")
                .with_subcollection("tags", None)
                .shape(),
            TargetShape::SUBCOLLECTION
        );
        assert_eq!(
            ResourceAddress::resource("vms", "1")
                .with_subcollection("tags", Some("3".into()))
                .shape(),
            TargetShape::SUBRESOURCE
        );
        assert_eq!(
            ResourceAddress::collection("vms")
                .with_subcollection("tags", None)
                .shape(),
            TargetShape {
                subject: Subject::Collection,
                target: Target::Subcollection
            }
        );
    }

    #[test]
    fn href_composes_present_segments() {
        let addr = ResourceAddress::resource("vms", "10")
            .with_subcollection("tags", Some("3".into()))
            .with_version("v2.1");
        assert_eq!(addr.href("/api/"), "/api/v2.1/vms/10/tags/3");
        assert_eq!(ResourceAddress::default().href("/api"), "/api");
    }

    #[test]
    fn verb_parsing_is_case_insensitive() {
        assert_eq!("PATCH".parse::<Verb>().unwrap(), Verb::Patch);
        assert_eq!(Verb::Delete.to_string(), "DELETE");
        assert!("TRACE".parse::<Verb>().is_err());
    }

    #[test]
    fn target_id_prefers_subcollection_side() {
        let addr =
            ResourceAddress::resource("vms", "10").with_subcollection("tags", Some("3".into()));
        assert_eq!(addr.target_collection(), Some("tags"));
        assert_eq!(addr.target_id(), Some("3"));
        let sub = ResourceAddress::resource("vms", "10").with_subcollection("tags", None);
        assert_eq!(sub.target_id(), None);
    }
}
