//! Field descriptors and per-type resource schemas.

use url::Url;

use crate::error::{CoreError, Result};

/// The kind of a mapped field, with its kind-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain value passed through as JSON.
    Attribute,
    /// Date attribute. `format` is a chrono format string; `None` means RFC 3339.
    Date { format: Option<String> },
    /// URL attribute. Relative values are resolved against `base_url`.
    Url { base_url: Option<Url> },
    /// Boolean attribute.
    Boolean,
    /// Reference to a single resource of `linked_type`.
    ToOne { linked_type: String },
    /// Reference to a collection of resources of `linked_type`.
    ToMany { linked_type: String },
}

impl FieldKind {
    /// Returns true for every attribute kind (plain or typed).
    #[must_use]
    pub fn is_attribute(&self) -> bool {
        !self.is_relationship()
    }

    /// Returns true for to-one and to-many relationships.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::ToOne { .. } | Self::ToMany { .. })
    }

    /// The linked resource type, for relationship kinds.
    #[must_use]
    pub fn linked_type(&self) -> Option<&str> {
        match self {
            Self::ToOne { linked_type } | Self::ToMany { linked_type } => Some(linked_type),
            _ => None,
        }
    }

    /// Short label used in error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Date { .. } => "date",
            Self::Url { .. } => "url",
            Self::Boolean => "boolean",
            Self::ToOne { .. } => "to-one",
            Self::ToMany { .. } => "to-many",
        }
    }
}

/// One mapped property of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Native field name, unique within a resource type.
    pub name: String,
    /// Wire key before key formatting. Defaults to `name`.
    pub serialized_name: String,
    /// Read-only fields are never serialized.
    pub read_only: bool,
    pub kind: FieldKind,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            read_only: false,
            kind,
        }
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Attribute)
    }

    /// Date attribute using RFC 3339 on the wire.
    #[must_use]
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date { format: None })
    }

    #[must_use]
    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Url { base_url: None })
    }

    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    #[must_use]
    pub fn to_one(name: impl Into<String>, linked_type: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::ToOne {
                linked_type: linked_type.into(),
            },
        )
    }

    #[must_use]
    pub fn to_many(name: impl Into<String>, linked_type: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::ToMany {
                linked_type: linked_type.into(),
            },
        )
    }

    /// Override the wire key.
    #[must_use]
    pub fn serialized_as(mut self, key: impl Into<String>) -> Self {
        self.serialized_name = key.into();
        self
    }

    /// Exclude this field from outbound serialization.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Set the date format of a date field. No effect on other kinds.
    #[must_use]
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        if let FieldKind::Date { format } = &mut self.kind {
            *format = Some(date_format.into());
        }
        self
    }

    /// Set the base URL of a URL field. No effect on other kinds.
    #[must_use]
    pub fn with_base_url(mut self, base: Url) -> Self {
        if let FieldKind::Url { base_url } = &mut self.kind {
            *base_url = Some(base);
        }
        self
    }
}

/// The ordered field list of one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSchema {
    resource_type: String,
    fields: Vec<Field>,
    meta: bool,
}

impl ResourceSchema {
    /// Build a schema, rejecting duplicate field names.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateField`] if two fields share a name.
    pub fn new(resource_type: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let resource_type = resource_type.into();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CoreError::DuplicateField {
                    resource_type,
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self {
            resource_type,
            fields,
            meta: false,
        })
    }

    /// Declare that resources of this type keep their `meta` object.
    #[must_use]
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn supports_meta(&self) -> bool {
        self.meta
    }

    /// Look up a field by its native name.
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.kind.is_attribute())
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.kind.is_relationship())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_schema() -> ResourceSchema {
        ResourceSchema::new(
            "articles",
            vec![
                Field::attribute("title"),
                Field::date("publishedAt").with_date_format("%Y-%m-%d"),
                Field::url("homepage"),
                Field::boolean("draft").read_only(),
                Field::to_one("author", "people").serialized_as("writer"),
                Field::to_many("comments", "comments"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn field_named_finds_by_native_name() {
        let schema = article_schema();
        let author = schema.field_named("author").unwrap();
        assert_eq!(author.serialized_name, "writer");
        assert_eq!(author.kind.linked_type(), Some("people"));
        assert!(schema.field_named("writer").is_none());
    }

    #[test]
    fn schema_preserves_declaration_order() {
        let schema = article_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["title", "publishedAt", "homepage", "draft", "author", "comments"]
        );
        assert_eq!(schema.attributes().count(), 4);
        assert_eq!(schema.relationships().count(), 2);
    }

    #[test]
    fn schema_rejects_duplicate_field_names() {
        let err = ResourceSchema::new(
            "articles",
            vec![Field::attribute("title"), Field::boolean("title")],
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateField { .. }));
    }

    #[test]
    fn kind_specific_builders_ignore_other_kinds() {
        let field = Field::attribute("name").with_date_format("%Y");
        assert_eq!(field.kind, FieldKind::Attribute);

        let date = Field::date("at").with_date_format("%Y");
        assert_eq!(
            date.kind,
            FieldKind::Date {
                format: Some("%Y".to_string())
            }
        );
        assert!(date.kind.is_attribute());
        assert_eq!(date.kind.label(), "date");
    }
}
