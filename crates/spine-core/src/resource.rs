//! Resource trait, identifiers, and native field values.

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use url::Url;

use crate::collection::LinkedResourceCollection;
use crate::error::{CoreError, Result};
use crate::field::{FieldKind, ResourceSchema};

/// A `(type, id)` pair: relationship linkage before a resource is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceIdentifier {
    #[must_use]
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// The value of a to-one relationship.
///
/// Either linkage to a pooled resource, a `related` URL to fetch it from,
/// or both. A value with only a URL is an unloaded placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedResource {
    pub linkage: Option<ResourceIdentifier>,
    pub related_url: Option<Url>,
}

impl LinkedResource {
    /// Linkage to a known resource.
    #[must_use]
    pub fn to(identifier: ResourceIdentifier) -> Self {
        Self {
            linkage: Some(identifier),
            related_url: None,
        }
    }

    /// Placeholder that only knows where to fetch the related resource.
    #[must_use]
    pub fn placeholder(related_url: Url) -> Self {
        Self {
            linkage: None,
            related_url: Some(related_url),
        }
    }

    #[must_use]
    pub fn with_related_url(mut self, related_url: Url) -> Self {
        self.related_url = Some(related_url);
        self
    }
}

/// A native field value held by a resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain attribute, kept as its JSON representation.
    Json(JsonValue),
    Bool(bool),
    Date(DateTime<Utc>),
    Url(Url),
    ToOne(LinkedResource),
    ToMany(LinkedResourceCollection),
}

impl Value {
    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(JsonValue::as_str)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_to_one(&self) -> Option<&LinkedResource> {
        match self {
            Self::ToOne(link) => Some(link),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_to_many(&self) -> Option<&LinkedResourceCollection> {
        match self {
            Self::ToMany(collection) => Some(collection),
            _ => None,
        }
    }

    /// Short label used in error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Bool(_) => "boolean",
            Self::Date(_) => "date",
            Self::Url(_) => "url",
            Self::ToOne(_) => "to-one",
            Self::ToMany(_) => "to-many",
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Json(JsonValue::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Json(JsonValue::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Url> for Value {
    fn from(u: Url) -> Self {
        Self::Url(u)
    }
}

impl From<LinkedResource> for Value {
    fn from(link: LinkedResource) -> Self {
        Self::ToOne(link)
    }
}

impl From<LinkedResourceCollection> for Value {
    fn from(collection: LinkedResourceCollection) -> Self {
        Self::ToMany(collection)
    }
}

/// State shared by every resource regardless of its type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCore {
    pub id: Option<String>,
    /// Canonical self link.
    pub url: Option<Url>,
    /// True once attributes have been populated from a server response.
    pub is_loaded: bool,
    pub meta: Option<Map<String, JsonValue>>,
    /// Raw relationship objects whose keys match no declared field.
    pub relationships: Map<String, JsonValue>,
}

/// Upcast helper so pooled trait objects can be downcast to their concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A typed JSON:API resource.
///
/// Implementors declare their ordered field list through [`Resource::schema`]
/// and expose field access by native name. Identity and load state live in
/// [`ResourceCore`].
pub trait Resource: AsAny + fmt::Debug + Send + Sync {
    fn schema(&self) -> &ResourceSchema;

    fn core(&self) -> &ResourceCore;

    fn core_mut(&mut self) -> &mut ResourceCore;

    /// Current value of the field named `field`, or `None` when unset.
    fn value(&self, field: &str) -> Option<Value>;

    /// Assign (or clear, with `None`) the field named `field`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] or [`CoreError::InvalidFieldValue`]
    /// when the field does not exist or cannot hold the value.
    fn set_value(&mut self, field: &str, value: Option<Value>) -> Result<()>;

    fn resource_type(&self) -> &str {
        self.schema().resource_type()
    }

    fn id(&self) -> Option<&str> {
        self.core().id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.core_mut().id = id;
    }

    fn url(&self) -> Option<&Url> {
        self.core().url.as_ref()
    }

    fn is_loaded(&self) -> bool {
        self.core().is_loaded
    }

    /// The `(type, id)` pair of this resource, if it has an id.
    fn identifier(&self) -> Option<ResourceIdentifier> {
        self.id().map(|id| ResourceIdentifier::new(self.resource_type(), id))
    }
}

/// Identifier of a resource that must already exist server-side.
///
/// # Errors
///
/// Returns [`CoreError::MissingId`] when the resource has no id.
pub fn require_identifier(resource: &dyn Resource) -> Result<ResourceIdentifier> {
    resource
        .identifier()
        .ok_or_else(|| CoreError::MissingId(resource.resource_type().to_string()))
}

/// Reject `value` unless it fits the kind of `field` on `schema`.
///
/// # Errors
///
/// Returns [`CoreError::UnknownField`] or [`CoreError::InvalidFieldValue`].
pub fn check_value(schema: &ResourceSchema, field: &str, value: &Value) -> Result<()> {
    let declared = schema
        .field_named(field)
        .ok_or_else(|| CoreError::UnknownField {
            resource_type: schema.resource_type().to_string(),
            field: field.to_string(),
        })?;

    let fits = match (&declared.kind, value) {
        (FieldKind::ToOne { .. }, Value::ToOne(_)) => true,
        (FieldKind::ToMany { .. }, Value::ToMany(_)) => true,
        (FieldKind::ToOne { .. } | FieldKind::ToMany { .. }, _) => false,
        (_, Value::ToOne(_) | Value::ToMany(_)) => false,
        _ => true,
    };

    if fits {
        Ok(())
    } else {
        Err(CoreError::InvalidFieldValue {
            field: field.to_string(),
            expected: declared.kind.label().to_string(),
            actual: value.label().to_string(),
        })
    }
}
