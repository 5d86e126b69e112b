//! Configuration for the resource access layer.
//!
//! Loaded once at startup: serialized defaults, then an optional YAML file,
//! then `RESOURCE_ACCESS_*` environment overrides (`__` separates nesting).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use resource_access_sdk::{AttributeType, Verb};
use serde::{Deserialize, Serialize};

use crate::domain::filter::FilterPriority;

/// Prefix of environment variables overriding file configuration.
pub const ENV_PREFIX: &str = "RESOURCE_ACCESS_";

fn default_api_prefix() -> String {
    "/api".to_owned()
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceAccessConfig {
    /// Canonical path prefix inserted into bare path fragments.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// How `or`-flagged filter clauses group with their neighbours.
    #[serde(default)]
    pub filter_priority: FilterPriority,

    /// Accepted version tags. Empty means any version is accepted.
    #[serde(default)]
    pub supported_versions: Vec<String>,

    /// Collection registry, keyed by collection name.
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,

    /// Type metadata backing the static schema inspector.
    #[serde(default)]
    pub types: BTreeMap<String, TypeSchemaConfig>,
}

impl Default for ResourceAccessConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            filter_priority: FilterPriority::default(),
            supported_versions: Vec::new(),
            collections: BTreeMap::new(),
            types: BTreeMap::new(),
        }
    }
}

impl ResourceAccessConfig {
    /// Load configuration from defaults, an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// `NotFound` when `path` is given but is not a file, `Invalid` when the
    /// merged sources do not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Parse configuration from an in-memory YAML document, without env overrides.
    ///
    /// # Errors
    ///
    /// `Invalid` when the document does not deserialize.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }
}

/// Behaviour flags of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOption {
    /// Addressable as a primary collection.
    Collection,
    /// Addressable as a subcollection of another collection.
    Subcollection,
    /// Declared actions without a dedicated handler go to the generic custom-action handler.
    CustomActions,
}

/// Registry entry of one collection, as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    #[serde(default)]
    pub description: String,

    /// Schema type backing the collection; required for filtering and attribute selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub klass: Option<String>,

    #[serde(default)]
    pub verbs: Vec<Verb>,

    #[serde(default)]
    pub options: Vec<CollectionOption>,

    /// Attributes that identify a record when a bulk element carries no id.
    #[serde(default)]
    pub identifying_attrs: Vec<String>,

    #[serde(default)]
    pub subcollections: Vec<String>,

    /// Handler names implemented for this collection. When absent, every
    /// declared action is assumed to have its conventional handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Vec<String>>,

    #[serde(default)]
    pub collection_actions: BTreeMap<Verb, Vec<ActionSpecConfig>>,

    #[serde(default)]
    pub resource_actions: BTreeMap<Verb, Vec<ActionSpecConfig>>,

    #[serde(default)]
    pub subcollection_actions: BTreeMap<Verb, Vec<ActionSpecConfig>>,

    #[serde(default)]
    pub subresource_actions: BTreeMap<Verb, Vec<ActionSpecConfig>>,
}

/// One action declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpecConfig {
    pub name: String,

    /// Permission identifier(s); any one granted is enough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifiers>,

    #[serde(default)]
    pub disabled: bool,

    /// Validation hook run by the dispatch boundary before the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,
}

/// A single permission identifier or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifiers {
    One(String),
    Many(Vec<String>),
}

impl Identifiers {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(id) => vec![id],
            Self::Many(ids) => ids,
        }
    }
}

/// Attribute metadata of one type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSchemaConfig {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeType>,

    #[serde(default)]
    pub virtual_attributes: BTreeMap<String, AttributeType>,

    /// Association name to associated type name.
    #[serde(default)]
    pub associations: BTreeMap<String, String>,
}
