//! Deserialization result: primary data, API errors, meta and links.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use spine_core::{Resource, ResourceCollection};
use url::Url;

use crate::pool::{ResourceHandle, ResourcePool};

/// Where an API error originated in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// One entry of a top-level `errors` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, JsonValue>>,
}

impl ApiError {
    /// Copy an error object field by field. Absent or mistyped keys stay `None`;
    /// numeric `status` and `code` values are kept as strings.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        let source = value.get("source").and_then(JsonValue::as_object).map(|s| ErrorSource {
            pointer: string_at(s.get("pointer")),
            parameter: string_at(s.get("parameter")),
        });

        Self {
            id: string_at(value.get("id")),
            status: string_at(value.get("status")),
            code: string_at(value.get("code")),
            title: string_at(value.get("title")),
            detail: string_at(value.get("detail")),
            source,
            meta: value.get("meta").and_then(JsonValue::as_object).cloned(),
        }
    }
}

fn string_at(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A deserialized JSON:API document.
///
/// `pool` owns every resource seen in the document (primary, included,
/// and linkage stubs); `data` lists the primary resources in input order.
#[derive(Debug, Default)]
pub struct JsonApiDocument {
    /// Primary resources. `None` when the document had no `data` key.
    pub data: Option<Vec<ResourceHandle>>,
    pub errors: Option<Vec<ApiError>>,
    pub meta: Option<Map<String, JsonValue>>,
    pub links: Option<BTreeMap<String, Url>>,
    /// Top-level `jsonapi` object.
    pub jsonapi: Option<Map<String, JsonValue>>,
    pub pool: ResourcePool,
}

impl JsonApiDocument {
    /// Primary resources in input order.
    pub fn primary(&self) -> impl Iterator<Item = &dyn Resource> {
        self.data
            .iter()
            .flatten()
            .filter_map(|handle| self.pool.get(*handle))
    }

    /// The first primary resource.
    #[must_use]
    pub fn first(&self) -> Option<&dyn Resource> {
        self.primary().next()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    #[must_use]
    pub fn link(&self, name: &str) -> Option<&Url> {
        self.links.as_ref()?.get(name)
    }

    /// The primary data as a loaded collection carrying pagination links.
    #[must_use]
    pub fn collection(&self) -> ResourceCollection {
        let members = self.primary().filter_map(Resource::identifier).collect();
        let mut collection = ResourceCollection::new(members, self.link("self").cloned());
        collection.next_url = self.link("next").cloned();
        collection.previous_url = self
            .link("prev")
            .or_else(|| self.link("previous"))
            .cloned();
        collection.is_loaded = true;
        collection
    }
}
