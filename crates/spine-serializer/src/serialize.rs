//! Resources → JSON:API document.

use serde_json::{json, Map, Value as JsonValue};
use spine_core::{require_identifier, FieldKind, Resource, ResourceIdentifier, Value};

use crate::error::{Result, SerializerError};
use crate::formatter::ValueFormatterRegistry;
use crate::key_format::KeyFormatter;

/// What to include when serializing resources.
///
/// The default includes ids only, so a partial update never touches
/// relationships unless asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationOptions {
    pub include_id: bool,
    pub include_to_one: bool,
    pub include_to_many: bool,
    /// Leave out unset attributes instead of sending explicit nulls.
    pub omit_null_values: bool,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self {
            include_id: true,
            include_to_one: false,
            include_to_many: false,
            omit_null_values: false,
        }
    }
}

impl SerializationOptions {
    #[must_use]
    pub fn with_id(mut self, include: bool) -> Self {
        self.include_id = include;
        self
    }

    #[must_use]
    pub fn with_to_one(mut self, include: bool) -> Self {
        self.include_to_one = include;
        self
    }

    #[must_use]
    pub fn with_to_many(mut self, include: bool) -> Self {
        self.include_to_many = include;
        self
    }

    #[must_use]
    pub fn omit_null_values(mut self, omit: bool) -> Self {
        self.omit_null_values = omit;
        self
    }

    /// Ids plus both relationship kinds.
    #[must_use]
    pub fn everything() -> Self {
        Self::default().with_to_one(true).with_to_many(true)
    }
}

/// Borrowed view of the collaborators one serialization needs.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSerializer<'a> {
    registry: &'a ValueFormatterRegistry,
    key_formatter: &'a dyn KeyFormatter,
    options: SerializationOptions,
}

impl<'a> ResourceSerializer<'a> {
    #[must_use]
    pub fn new(
        registry: &'a ValueFormatterRegistry,
        key_formatter: &'a dyn KeyFormatter,
        options: SerializationOptions,
    ) -> Self {
        Self {
            registry,
            key_formatter,
            options,
        }
    }

    /// Build the `{"data": ..}` document. One resource gives an object,
    /// any other count gives an array.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::UnencodableValue`] when an attribute holds
    /// a relationship value.
    pub fn serialize_value(&self, resources: &[&dyn Resource]) -> Result<JsonValue> {
        let data = match resources {
            [single] => self.resource_object(*single)?,
            many => JsonValue::Array(
                many.iter()
                    .map(|r| self.resource_object(*r))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(json!({ "data": data }))
    }

    /// [`ResourceSerializer::serialize_value`] encoded as bytes.
    ///
    /// # Errors
    ///
    /// As [`ResourceSerializer::serialize_value`], plus
    /// [`SerializerError::JsonSerialization`] if encoding fails.
    pub fn serialize(&self, resources: &[&dyn Resource]) -> Result<Vec<u8>> {
        to_bytes(&self.serialize_value(resources)?)
    }

    fn resource_object(&self, resource: &dyn Resource) -> Result<JsonValue> {
        let mut object = Map::new();
        object.insert("type".to_string(), json!(resource.resource_type()));
        if self.options.include_id {
            if let Some(id) = resource.id() {
                object.insert("id".to_string(), json!(id));
            }
        }

        let mut attributes = Map::new();
        let mut relationships = Map::new();
        for field in resource.schema().fields().iter().filter(|f| !f.read_only) {
            let key = self.key_formatter.format(field);
            let value = resource.value(&field.name);
            match &field.kind {
                FieldKind::ToOne { .. } => {
                    if !self.options.include_to_one {
                        continue;
                    }
                    let data = match value {
                        Some(Value::ToOne(link)) => match link.linkage {
                            Some(identifier) => linkage(&identifier),
                            // only a related URL: the linkage is unknown, not empty
                            None => continue,
                        },
                        _ => JsonValue::Null,
                    };
                    relationships.insert(key, json!({ "data": data }));
                }
                FieldKind::ToMany { .. } => {
                    if !self.options.include_to_many {
                        continue;
                    }
                    let members = match value {
                        Some(Value::ToMany(collection)) => collection.known_members(),
                        _ => None,
                    };
                    if let Some(members) = members {
                        let data: Vec<JsonValue> = members.iter().map(linkage).collect();
                        relationships.insert(key, json!({ "data": data }));
                    }
                }
                _ => {
                    let formatted = match value {
                        Some(value) => self.registry.format(&value, field)?,
                        None => JsonValue::Null,
                    };
                    if formatted.is_null() && self.options.omit_null_values {
                        continue;
                    }
                    attributes.insert(key, formatted);
                }
            }
        }

        if !attributes.is_empty() {
            object.insert("attributes".to_string(), JsonValue::Object(attributes));
        }
        if !relationships.is_empty() {
            object.insert("relationships".to_string(), JsonValue::Object(relationships));
        }
        Ok(JsonValue::Object(object))
    }
}

fn linkage(identifier: &ResourceIdentifier) -> JsonValue {
    json!({ "type": identifier.resource_type, "id": identifier.id })
}

/// Body of a to-one relationship update: `{"data": {type, id}}`, or
/// `{"data": null}` to clear it.
///
/// # Errors
///
/// Returns [`SerializerError::Core`] if the resource has no id.
pub fn serialize_link_data(resource: Option<&dyn Resource>) -> Result<JsonValue> {
    let data = match resource {
        Some(resource) => linkage(&require_identifier(resource)?),
        None => JsonValue::Null,
    };
    Ok(json!({ "data": data }))
}

/// Body of a to-many relationship update: `{"data": [{type, id}, ..]}`.
#[must_use]
pub fn serialize_linked_resources(resources: &[ResourceIdentifier]) -> JsonValue {
    let data: Vec<JsonValue> = resources.iter().map(linkage).collect();
    json!({ "data": data })
}

pub(crate) fn to_bytes(value: &JsonValue) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(SerializerError::JsonSerialization)
}
