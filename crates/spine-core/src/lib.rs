//! # spine-core
//!
//! Resource model for the Spine JSON:API client.
//!
//! This crate defines the in-memory side of the wire mapping:
//! - [`Field`], [`FieldKind`], [`ResourceSchema`] — declarative field metadata
//! - [`Resource`] — the accessor interface every resource type implements
//! - [`ResourceIdentifier`] — `(type, id)` linkage
//! - [`Value`] / [`LinkedResource`] — native field values
//! - [`ResourceCollection`] / [`LinkedResourceCollection`] — list and to-many members
//! - [`DynamicResource`] — map-backed resource for runtime-declared types
//! - Error type ([`CoreError`])

pub mod collection;
pub mod dynamic;
pub mod error;
pub mod field;
pub mod resource;

pub use collection::{LinkedResourceCollection, ResourceCollection};
pub use dynamic::DynamicResource;
pub use error::{CoreError, Result};
pub use field::{Field, FieldKind, ResourceSchema};
pub use resource::{
    check_value, require_identifier, AsAny, LinkedResource, Resource, ResourceCore,
    ResourceIdentifier, Value,
};
