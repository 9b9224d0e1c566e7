//! JSON:API document → resource pool.
//!
//! One pass over the document: shape checks, primary data, included data,
//! top-level errors/meta/links, then a resolution pass that loads every
//! to-many collection whose linkage is fully present in the pool.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};
use spine_core::{
    Field, FieldKind, LinkedResource, LinkedResourceCollection, Resource, ResourceIdentifier,
    Value,
};
use tracing::{debug, warn};
use url::Url;

use crate::document::{ApiError, JsonApiDocument};
use crate::error::{Result, SerializerError};
use crate::factory::ResourceFactory;
use crate::formatter::ValueFormatterRegistry;
use crate::key_format::KeyFormatter;
use crate::pool::{ResourceHandle, ResourcePool};

/// Borrowed view of the collaborators one deserialization needs.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'a> {
    factory: &'a ResourceFactory,
    registry: &'a ValueFormatterRegistry,
    key_formatter: &'a dyn KeyFormatter,
    /// Relative links are joined onto this.
    base_url: Option<&'a Url>,
}

impl<'a> Deserializer<'a> {
    #[must_use]
    pub fn new(
        factory: &'a ResourceFactory,
        registry: &'a ValueFormatterRegistry,
        key_formatter: &'a dyn KeyFormatter,
    ) -> Self {
        Self {
            factory,
            registry,
            key_formatter,
            base_url: None,
        }
    }

    /// Resolve relative links (`"/articles/1"`) against `base_url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<&'a Url>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Parse raw bytes and deserialize them.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::InvalidJson`] if `bytes` is not JSON, and
    /// otherwise the errors of [`Deserializer::deserialize_value`].
    pub fn deserialize_slice(
        &self,
        bytes: &[u8],
        mapping_targets: Vec<Box<dyn Resource>>,
    ) -> Result<JsonApiDocument> {
        let root: JsonValue = serde_json::from_slice(bytes).map_err(SerializerError::InvalidJson)?;
        self.deserialize_value(&root, mapping_targets)
    }

    /// Deserialize a parsed document.
    ///
    /// `mapping_targets` are moved into the pool ahead of everything else;
    /// primary resources are mapped onto them by position within their type.
    /// They come back as the first slots of the returned document's pool.
    ///
    /// # Errors
    ///
    /// Document shape violations, malformed resource objects, and resource
    /// types the factory does not know abort the whole document.
    pub fn deserialize_value(
        &self,
        root: &JsonValue,
        mapping_targets: Vec<Box<dyn Resource>>,
    ) -> Result<JsonApiDocument> {
        let object = validate_document(root)?;
        let mut pool = ResourcePool::with_mapping_targets(mapping_targets);

        let data = match object.get("data") {
            None => None,
            Some(JsonValue::Null) => Some(Vec::new()),
            Some(JsonValue::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.extract_resource(item, &mut pool, Some(index)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(item) => Some(vec![self.extract_resource(item, &mut pool, Some(0))?]),
        };

        match object.get("included") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(items)) => {
                for item in items {
                    self.extract_resource(item, &mut pool, None)?;
                }
            }
            Some(_) => {
                return Err(SerializerError::InvalidResourceStructure(
                    "'included' must be an array".to_string(),
                ))
            }
        }

        let errors = match object.get("errors") {
            None => None,
            Some(JsonValue::Array(items)) => Some(items.iter().map(ApiError::from_json).collect()),
            Some(_) => return Err(SerializerError::InvalidDocumentStructure),
        };

        resolve_to_many(&mut pool)?;

        debug!(
            primary = data.as_ref().map_or(0, Vec::len),
            pooled = pool.len(),
            "deserialized document"
        );

        Ok(JsonApiDocument {
            data,
            errors,
            meta: top_level_object(object, "meta").cloned(),
            links: top_level_object(object, "links").map(|links| self.extract_links(links)),
            jsonapi: top_level_object(object, "jsonapi").cloned(),
            pool,
        })
    }

    /// Deserialize one resource object into the pool.
    fn extract_resource(
        &self,
        item: &JsonValue,
        pool: &mut ResourcePool,
        index: Option<usize>,
    ) -> Result<ResourceHandle> {
        let object = item.as_object().ok_or_else(|| {
            SerializerError::InvalidResourceStructure("resource object must be a JSON object".to_string())
        })?;
        let resource_type = object
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or(SerializerError::ResourceTypeMissing)?;
        let id = object
            .get("id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| SerializerError::ResourceIdMissing(resource_type.to_string()))?;

        let handle = self.factory.dispense(resource_type, id, pool, index)?;
        let schema = pool[handle].schema();
        let fields = schema.fields().to_vec();
        let supports_meta = schema.supports_meta();

        let attributes = object.get("attributes").and_then(JsonValue::as_object);
        let relationships = object.get("relationships").and_then(JsonValue::as_object);

        // Relationship targets are dispensed while the pool is still free to
        // grow, so the values are collected before touching the resource.
        let mut assignments: Vec<(String, Option<Value>)> = Vec::new();
        for field in &fields {
            let key = self.key_formatter.format(field);
            let assignment = match &field.kind {
                FieldKind::ToOne { .. } => relationships
                    .and_then(|r| r.get(&key))
                    .map(|rel| self.to_one(&key, rel, pool))
                    .transpose()?
                    .flatten(),
                FieldKind::ToMany { .. } => relationships
                    .and_then(|r| r.get(&key))
                    .map(|rel| self.to_many(&key, rel))
                    .transpose()?
                    .flatten(),
                _ => attributes
                    .and_then(|a| a.get(&key))
                    .map(|raw| self.attribute(raw, field)),
            };
            if let Some(value) = assignment {
                assignments.push((field.name.clone(), value));
            }
        }

        let unmodeled: Vec<(String, JsonValue)> = relationships
            .into_iter()
            .flatten()
            .filter(|(key, _)| {
                !fields
                    .iter()
                    .any(|f| f.kind.is_relationship() && self.key_formatter.format(f) == **key)
            })
            .map(|(key, rel)| (key.clone(), rel.clone()))
            .collect();

        let resource = &mut pool[handle];
        let self_link = object
            .get("links")
            .and_then(|l| l.get("self"))
            .and_then(|l| self.link_url(l));
        if let Some(url) = self_link {
            resource.core_mut().url = Some(url);
        }
        if supports_meta {
            if let Some(meta) = object.get("meta").and_then(JsonValue::as_object) {
                resource.core_mut().meta = Some(meta.clone());
            }
        }
        for (name, value) in assignments {
            resource.set_value(&name, value)?;
        }
        resource.core_mut().relationships.extend(unmodeled);
        resource.core_mut().is_loaded = true;

        Ok(handle)
    }

    /// Present-but-null clears the field; anything else goes through the registry.
    fn attribute(&self, raw: &JsonValue, field: &Field) -> Option<Value> {
        if raw.is_null() {
            None
        } else {
            Some(self.registry.unformat(raw, field))
        }
    }

    /// Outer `None` leaves the field untouched; `Some(None)` clears it.
    fn to_one(
        &self,
        key: &str,
        relationship: &JsonValue,
        pool: &mut ResourcePool,
    ) -> Result<Option<Option<Value>>> {
        let related = relationship
            .get("links")
            .and_then(|l| l.get("related"))
            .and_then(|l| self.link_url(l));

        match relationship.get("data") {
            Some(JsonValue::Null) => Ok(Some(None)),
            Some(data) => {
                let identifier = linkage(key, data)?;
                let target =
                    self.factory
                        .dispense(&identifier.resource_type, &identifier.id, pool, None)?;
                if let Some(url) = &related {
                    let core = pool[target].core_mut();
                    if core.url.is_none() {
                        core.url = Some(url.clone());
                    }
                }
                let link = LinkedResource {
                    linkage: Some(identifier),
                    related_url: related,
                };
                Ok(Some(Some(Value::ToOne(link))))
            }
            None => Ok(related.map(|url| Some(Value::ToOne(LinkedResource::placeholder(url))))),
        }
    }

    fn to_many(&self, key: &str, relationship: &JsonValue) -> Result<Option<Option<Value>>> {
        let links = relationship.get("links");
        let related = links.and_then(|l| l.get("related")).and_then(|l| self.link_url(l));
        let self_link = links.and_then(|l| l.get("self")).and_then(|l| self.link_url(l));
        let linkage = match relationship.get("data") {
            Some(JsonValue::Array(items)) => Some(
                items
                    .iter()
                    .map(|item| linkage(key, item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None | Some(JsonValue::Null) => None,
            Some(_) => {
                return Err(SerializerError::InvalidResourceStructure(format!(
                    "to-many relationship '{key}' must carry an array of linkage"
                )))
            }
        };

        if related.is_none() && self_link.is_none() && linkage.is_none() {
            return Ok(None);
        }
        let collection = LinkedResourceCollection::new(related, self_link, linkage);
        Ok(Some(Some(Value::ToMany(collection))))
    }

    /// A link is either a URL string or an object with an `href`. Relative
    /// references resolve against the base URL when one is set.
    fn link_url(&self, value: &JsonValue) -> Option<Url> {
        let raw = match value {
            JsonValue::String(s) => s.as_str(),
            JsonValue::Object(o) => o.get("href").and_then(JsonValue::as_str)?,
            JsonValue::Null => return None,
            other => {
                warn!(link = %other, "ignoring link that is neither a string nor an object");
                return None;
            }
        };
        let parsed = match self.base_url {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };
        match parsed {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(link = raw, error = %e, "ignoring unparseable link");
                None
            }
        }
    }

    fn extract_links(&self, links: &Map<String, JsonValue>) -> BTreeMap<String, Url> {
        links
            .iter()
            .filter_map(|(name, value)| self.link_url(value).map(|url| (name.clone(), url)))
            .collect()
    }
}

fn linkage(key: &str, data: &JsonValue) -> Result<ResourceIdentifier> {
    let field = |name: &str| data.get(name).and_then(JsonValue::as_str);
    match (field("type"), field("id")) {
        (Some(resource_type), Some(id)) => Ok(ResourceIdentifier::new(resource_type, id)),
        _ => Err(SerializerError::InvalidResourceStructure(format!(
            "relationship '{key}' has linkage without a type and id"
        ))),
    }
}

fn validate_document(root: &JsonValue) -> Result<&Map<String, JsonValue>> {
    let object = root
        .as_object()
        .ok_or(SerializerError::InvalidDocumentStructure)?;

    let has_data = object.contains_key("data");
    let has_errors = object.contains_key("errors");
    if !has_data && !has_errors && !object.contains_key("meta") {
        return Err(SerializerError::TopLevelEntryMissing);
    }
    if has_data && has_errors {
        return Err(SerializerError::TopLevelDataAndErrorsCoexist);
    }
    Ok(object)
}

fn top_level_object<'d>(
    object: &'d Map<String, JsonValue>,
    key: &str,
) -> Option<&'d Map<String, JsonValue>> {
    match object.get(key)? {
        JsonValue::Object(member) => Some(member),
        JsonValue::Null => None,
        other => {
            warn!(member = key, value = %other, "ignoring top-level member that is not an object");
            None
        }
    }
}

/// Load every unloaded to-many collection whose linkage is entirely pooled.
/// Collections with any missing target keep only their linkage.
fn resolve_to_many(pool: &mut ResourcePool) -> Result<()> {
    let handles: Vec<ResourceHandle> = pool.handles().collect();
    for handle in handles {
        let resolvable: Vec<(String, LinkedResourceCollection)> = {
            let resource = &pool[handle];
            resource
                .schema()
                .fields()
                .iter()
                .filter(|f| matches!(f.kind, FieldKind::ToMany { .. }))
                .filter_map(|f| match resource.value(&f.name) {
                    Some(Value::ToMany(collection)) if !collection.is_loaded() => {
                        Some((f.name.clone(), collection))
                    }
                    _ => None,
                })
                .filter(|(_, collection)| {
                    collection.linkage.as_ref().is_some_and(|linkage| {
                        linkage.iter().all(|id| pool.find_identifier(id).is_some())
                    })
                })
                .collect()
        };

        for (name, mut collection) in resolvable {
            let members = collection.linkage.clone().unwrap_or_default();
            collection.resolve(members);
            pool[handle].set_value(&name, Some(Value::ToMany(collection)))?;
        }
    }
    Ok(())
}
