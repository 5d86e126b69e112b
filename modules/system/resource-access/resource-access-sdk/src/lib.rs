#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Resource Access SDK
//!
//! This crate provides the public contract of the resource access layer:
//!
//! - [`ResourceAddress`] - What a request operates on (collection, ids, version)
//! - [`Expression`], [`Condition`], [`FilterOp`] - Compiled filter trees and their wire shape
//! - [`OperationDescriptor`] - Fully resolved operation handed to the dispatch boundary
//! - [`SchemaInspector`], [`PermissionEvaluator`], [`IdDecoder`], [`IdentityResolver`] -
//!   Narrow collaborator traits consumed by the layer
//! - [`AccessError`] - Error taxonomy (`BadRequest` / `Forbidden` / `NotFound` classes)
//!
//! ## Usage
//!
//! ```ignore
//! use resource_access_sdk::{AccessError, OperationDescriptor};
//!
//! let descriptor: OperationDescriptor = service.prepare(&request, &permissions)?;
//! match descriptor.handler_name.as_str() {
//!     "read_resource" => { /* ... */ }
//!     _ => return Err(AccessError::unsupported_action("no handler")),
//! }
//! ```

pub mod api;
pub mod error;
pub mod expression;
pub mod models;

pub use api::{AttributeType, IdDecoder, IdentityResolver, PermissionEvaluator, SchemaInspector};
pub use error::{AccessError, ErrorKind};
pub use expression::{Condition, Expression, FieldRef, FilterOp};
pub use models::{
    ElementFailure, OperationDescriptor, ResourceAddress, Subject, Target, TargetShape, Verb,
};
