//! The `Serializer` facade: owns the factory, formatters and key style.

use serde_json::Value as JsonValue;
use spine_core::{Resource, ResourceIdentifier};
use url::Url;

use crate::deserialize::Deserializer;
use crate::document::JsonApiDocument;
use crate::error::Result;
use crate::factory::ResourceFactory;
use crate::formatter::{ValueFormatter, ValueFormatterRegistry};
use crate::key_format::{AsIsKeyFormatter, KeyFormat, KeyFormatter};
use crate::serialize::{self, ResourceSerializer, SerializationOptions};

/// Entry point for converting between JSON:API documents and resources.
///
/// Configure it once (register types and formatters), then share it
/// read-only; every call builds its own resource pool.
#[derive(Debug)]
pub struct Serializer {
    factory: ResourceFactory,
    registry: ValueFormatterRegistry,
    key_formatter: Box<dyn KeyFormatter>,
    base_url: Option<Url>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self {
            factory: ResourceFactory::new(),
            registry: ValueFormatterRegistry::default_registry(),
            key_formatter: Box::new(AsIsKeyFormatter),
            base_url: None,
        }
    }
}

impl Serializer {
    /// A serializer with the default formatters and as-is keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key_formatter(mut self, key_formatter: impl KeyFormatter + 'static) -> Self {
        self.key_formatter = Box::new(key_formatter);
        self
    }

    #[must_use]
    pub fn with_key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_formatter = key_format.formatter();
        self
    }

    /// Base for relative links in incoming documents.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Replace the value formatter registry wholesale.
    #[must_use]
    pub fn with_value_formatters(mut self, registry: ValueFormatterRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn factory(&self) -> &ResourceFactory {
        &self.factory
    }

    #[must_use]
    pub fn registry(&self) -> &ValueFormatterRegistry {
        &self.registry
    }

    #[must_use]
    pub fn key_formatter(&self) -> &dyn KeyFormatter {
        self.key_formatter.as_ref()
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn register_resource<T>(&mut self)
    where
        T: Resource + Default,
    {
        self.factory.register_resource::<T>();
    }

    pub fn register<F>(&mut self, resource_type: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
    {
        self.factory.register(resource_type, constructor);
    }

    /// Append a value formatter after the ones already registered.
    pub fn register_value_formatter(&mut self, formatter: impl ValueFormatter + 'static) {
        self.registry.register(formatter);
    }

    fn deserializer(&self) -> Deserializer<'_> {
        Deserializer::new(&self.factory, &self.registry, self.key_formatter.as_ref())
            .with_base_url(self.base_url.as_ref())
    }

    fn resource_serializer(&self, options: SerializationOptions) -> ResourceSerializer<'_> {
        ResourceSerializer::new(&self.registry, self.key_formatter.as_ref(), options)
    }

    /// Deserialize raw document bytes, populating `mapping_targets` in place
    /// where the primary data lines up with them.
    ///
    /// # Errors
    ///
    /// See [`Deserializer::deserialize_value`].
    pub fn deserialize_data(
        &self,
        bytes: &[u8],
        mapping_targets: Vec<Box<dyn Resource>>,
    ) -> Result<JsonApiDocument> {
        self.deserializer().deserialize_slice(bytes, mapping_targets)
    }

    /// Deserialize an already parsed document.
    ///
    /// # Errors
    ///
    /// See [`Deserializer::deserialize_value`].
    pub fn deserialize_value(
        &self,
        document: &JsonValue,
        mapping_targets: Vec<Box<dyn Resource>>,
    ) -> Result<JsonApiDocument> {
        self.deserializer().deserialize_value(document, mapping_targets)
    }

    /// # Errors
    ///
    /// See [`ResourceSerializer::serialize`].
    pub fn serialize_resources(
        &self,
        resources: &[&dyn Resource],
        options: SerializationOptions,
    ) -> Result<Vec<u8>> {
        self.resource_serializer(options).serialize(resources)
    }

    /// # Errors
    ///
    /// See [`ResourceSerializer::serialize_value`].
    pub fn serialize_resources_value(
        &self,
        resources: &[&dyn Resource],
        options: SerializationOptions,
    ) -> Result<JsonValue> {
        self.resource_serializer(options).serialize_value(resources)
    }

    /// Encoded body for a to-one relationship update.
    ///
    /// # Errors
    ///
    /// See [`serialize::serialize_link_data`].
    pub fn serialize_link_data(&self, resource: Option<&dyn Resource>) -> Result<Vec<u8>> {
        serialize::to_bytes(&serialize::serialize_link_data(resource)?)
    }

    /// Encoded body for adding or removing to-many members.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SerializerError::JsonSerialization`] if encoding fails.
    pub fn serialize_linked_resources(&self, resources: &[ResourceIdentifier]) -> Result<Vec<u8>> {
        serialize::to_bytes(&serialize::serialize_linked_resources(resources))
    }
}
