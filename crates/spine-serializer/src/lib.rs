//! # spine-serializer
//!
//! Converts JSON:API documents to resource graphs and back.
//!
//! - [`Serializer`] — facade owning the factory, formatters, and key style
//! - [`Deserializer`] / [`ResourceSerializer`] — the two single-pass converters
//! - [`ResourceFactory`] / [`ResourcePool`] — type registry and per-call arena
//! - [`ValueFormatterRegistry`] — typed attribute conversion
//! - [`KeyFormatter`] — wire-key naming conventions
//! - [`JsonApiDocument`] — deserialization result
//! - [`SpineConfig`] — YAML-declared resource types
//! - Error type ([`SerializerError`])

pub mod config;
pub mod deserialize;
pub mod document;
pub mod error;
pub mod factory;
pub mod formatter;
pub mod key_format;
pub mod pool;
pub mod serialize;
pub mod serializer;

pub use config::{FieldConfig, FieldKindName, ResourceConfig, SpineConfig};
pub use deserialize::Deserializer;
pub use document::{ApiError, ErrorSource, JsonApiDocument};
pub use error::{Result, SerializerError};
pub use factory::{Constructor, ResourceFactory};
pub use formatter::{
    BooleanFormatter, DateFormatter, UrlFormatter, ValueFormatter, ValueFormatterRegistry,
};
pub use key_format::{
    AsIsKeyFormatter, DasherizedKeyFormatter, KeyFormat, KeyFormatter, UnderscoredKeyFormatter,
};
pub use pool::{ResourceHandle, ResourcePool};
pub use serialize::{
    serialize_link_data, serialize_linked_resources, ResourceSerializer, SerializationOptions,
};
pub use serializer::Serializer;
