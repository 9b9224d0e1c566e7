//! YAML schema configuration.
//!
//! Declares resource types at runtime and builds a [`Serializer`] whose
//! factory produces [`DynamicResource`] instances for them.
//!
//! ```yaml
//! key_format: dasherized
//! base_url: https://example.com/api/
//! resources:
//!   - type: articles
//!     meta: true
//!     fields:
//!       - name: title
//!       - name: publishedAt
//!         kind: date
//!       - name: author
//!         kind: to-one
//!         linked_type: people
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use spine_core::{DynamicResource, Field, FieldKind, ResourceSchema};
use tracing::warn;
use url::Url;

use crate::error::{Result, SerializerError};
use crate::key_format::KeyFormat;
use crate::serializer::Serializer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpineConfig {
    #[serde(default)]
    pub key_format: KeyFormat,
    /// Base for relative links in incoming documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Keep the `meta` object of resources of this type.
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKindName {
    #[default]
    Attribute,
    Date,
    Url,
    Boolean,
    ToOne,
    ToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_name: Option<String>,
    #[serde(default)]
    pub kind: FieldKindName,
    #[serde(default)]
    pub read_only: bool,
    /// Date format (chrono syntax).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_type: Option<String>,
}

impl FieldConfig {
    /// # Errors
    ///
    /// Returns [`SerializerError::Config`] for a relationship without `linked_type`.
    pub fn to_field(&self) -> Result<Field> {
        let linked_type = || {
            self.linked_type.clone().ok_or_else(|| {
                SerializerError::Config(format!(
                    "relationship field '{}' needs a linked_type",
                    self.name
                ))
            })
        };

        let kind = match self.kind {
            FieldKindName::Attribute => FieldKind::Attribute,
            FieldKindName::Date => FieldKind::Date {
                format: self.format.clone(),
            },
            FieldKindName::Url => FieldKind::Url {
                base_url: self.base_url.clone(),
            },
            FieldKindName::Boolean => FieldKind::Boolean,
            FieldKindName::ToOne => FieldKind::ToOne {
                linked_type: linked_type()?,
            },
            FieldKindName::ToMany => FieldKind::ToMany {
                linked_type: linked_type()?,
            },
        };

        let mut field = Field::attribute(self.name.clone());
        field.kind = kind;
        if let Some(key) = &self.serialized_name {
            field = field.serialized_as(key.clone());
        }
        if self.read_only {
            field = field.read_only();
        }
        Ok(field)
    }
}

impl ResourceConfig {
    /// # Errors
    ///
    /// Fails on invalid field declarations or duplicate field names.
    pub fn to_schema(&self) -> Result<ResourceSchema> {
        let fields = self
            .fields
            .iter()
            .map(FieldConfig::to_field)
            .collect::<Result<Vec<_>>>()?;
        let schema = ResourceSchema::new(self.resource_type.clone(), fields)?;
        Ok(if self.meta { schema.with_meta() } else { schema })
    }
}

impl SpineConfig {
    /// # Errors
    ///
    /// Returns [`SerializerError::Config`] if the YAML does not match.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| SerializerError::Config(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`SerializerError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            SerializerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Build a serializer with every declared type registered.
    ///
    /// # Errors
    ///
    /// Fails on invalid field declarations, duplicate field names, or a
    /// resource type declared twice.
    pub fn build(&self) -> Result<Serializer> {
        let mut serializer = Serializer::new().with_key_format(self.key_format);
        if let Some(base_url) = &self.base_url {
            serializer = serializer.with_base_url(base_url.clone());
        }

        for resource in &self.resources {
            if serializer.factory().is_registered(&resource.resource_type) {
                return Err(SerializerError::Config(format!(
                    "resource type '{}' is declared twice",
                    resource.resource_type
                )));
            }
            let schema = Arc::new(resource.to_schema()?);
            serializer.register(resource.resource_type.clone(), move || {
                Box::new(DynamicResource::new(schema.clone()))
            });
        }

        for resource in &self.resources {
            for linked in resource.fields.iter().filter_map(|f| f.linked_type.as_deref()) {
                if !serializer.factory().is_registered(linked) {
                    warn!(
                        resource_type = %resource.resource_type,
                        linked_type = linked,
                        "linked type is not declared; documents linking to it will fail"
                    );
                }
            }
        }

        Ok(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
key_format: dasherized
base_url: https://example.com/api/
resources:
  - type: articles
    meta: true
    fields:
      - name: title
      - name: publishedAt
        kind: date
        format: "%Y-%m-%d"
      - name: slug
        read_only: true
      - name: author
        kind: to-one
        linked_type: people
      - name: comments
        kind: to-many
        linked_type: comments
        serialized_name: replies
  - type: people
    fields:
      - name: name
  - type: comments
"#;

    #[test]
    fn parses_and_builds() {
        let config = SpineConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.key_format, KeyFormat::Dasherized);
        assert_eq!(config.resources.len(), 3);

        let schema = config.resources[0].to_schema().unwrap();
        assert!(schema.supports_meta());
        assert_eq!(
            schema.field_named("publishedAt").unwrap().kind,
            FieldKind::Date {
                format: Some("%Y-%m-%d".to_string())
            }
        );
        assert!(schema.field_named("slug").unwrap().read_only);
        assert_eq!(schema.field_named("comments").unwrap().serialized_name, "replies");

        let serializer = config.build().unwrap();
        assert_eq!(
            serializer.base_url().map(Url::as_str),
            Some("https://example.com/api/")
        );
        assert_eq!(
            serializer.factory().registered_types(),
            vec!["articles", "comments", "people"]
        );
        let article = serializer.factory().instantiate("articles").unwrap();
        assert_eq!(article.schema().fields().len(), 5);
    }

    #[test]
    fn relationship_without_linked_type_is_rejected() {
        let yaml = "resources:\n  - type: a\n    fields:\n      - name: b\n        kind: to-one\n";
        let err = SpineConfig::from_yaml_str(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, SerializerError::Config(msg) if msg.contains("linked_type")));
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let yaml = "resources:\n  - type: a\n  - type: a\n";
        let err = SpineConfig::from_yaml_str(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, SerializerError::Config(msg) if msg.contains("twice")));
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let yaml = "resources:\n  - type: a\n    fields:\n      - name: b\n        kind: blob\n";
        assert!(matches!(
            SpineConfig::from_yaml_str(yaml),
            Err(SerializerError::Config(_))
        ));
    }

    #[test]
    fn every_kind_maps_onto_field_kind() {
        let yaml = r#"
resources:
  - type: links
    fields:
      - name: plain
      - name: home
        kind: url
        base_url: "https://example.com/"
      - name: active
        kind: boolean
      - name: owner
        kind: to-one
        linked_type: people
      - name: tags
        kind: to-many
        linked_type: tags
"#;
        let config = SpineConfig::from_yaml_str(yaml).unwrap();
        let schema = config.resources[0].to_schema().unwrap();
        let kinds: Vec<&FieldKind> = schema.fields().iter().map(|f| &f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &FieldKind::Attribute,
                &FieldKind::Url {
                    base_url: Some(Url::parse("https://example.com/").unwrap())
                },
                &FieldKind::Boolean,
                &FieldKind::ToOne {
                    linked_type: "people".to_string()
                },
                &FieldKind::ToMany {
                    linked_type: "tags".to_string()
                },
            ]
        );
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, YAML).unwrap();
        let config = SpineConfig::load(&path).unwrap();
        assert_eq!(config.resources[1].resource_type, "people");

        let missing = SpineConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, SerializerError::Config(_)));
    }
}
