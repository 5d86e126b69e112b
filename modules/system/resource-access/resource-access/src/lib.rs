//! Resource Access Layer
//!
//! Turns an inbound request (verb, href, body, filter clauses) into an
//! [`OperationDescriptor`](resource_access_sdk::OperationDescriptor): the
//! href is located, the action resolved against the collection registry and
//! permission-checked, bulk elements classified, and filters compiled.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{ConfigError, ResourceAccessConfig};
pub use domain::collaborators::{NoIdentityLookup, StaticPermissions};
pub use domain::filter::{FilterCompiler, FilterPriority};
pub use domain::id_codec::CompressedIdDecoder;
pub use domain::locator::ResourceLocator;
pub use domain::registry::{CollectionRegistry, RegistryError};
pub use domain::resolver::ActionResolver;
pub use domain::schema::StaticSchema;
pub use domain::service::{ApiRequest, ResourceAccessService};
pub use domain::shape::{RequestShape, ShapeClassifier};
