//! Spine CLI — decode and encode JSON:API documents against a YAML schema.
//!
//! Commands: decode, encode

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser};
use serde_json::{json, Map, Value as JsonValue};
use spine_core::{FieldKind, Resource, ResourceIdentifier, Value};
use spine_serializer::{JsonApiDocument, SerializationOptions, Serializer, SpineConfig};
use tracing::{debug, Level};
use url::Url;

#[derive(Parser)]
#[command(name = "spine")]
#[command(version)]
#[command(about = "JSON:API resource graph serialization")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// JSON:API document to read
    document: PathBuf,
    /// YAML file declaring the resource types
    #[arg(short, long)]
    schema: PathBuf,
    /// Resolve relative links against this URL (overrides the schema's base_url)
    #[arg(long)]
    base_url: Option<Url>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the resource graph of a document
    Decode {
        #[command(flatten)]
        input: Input,
    },
    /// Decode a document and serialize its primary data again
    Encode {
        #[command(flatten)]
        input: Input,
        /// Include to-one relationship linkage
        #[arg(long)]
        to_one: bool,
        /// Include to-many relationship linkage
        #[arg(long)]
        to_many: bool,
        /// Leave out unset attributes instead of writing null
        #[arg(long)]
        omit_nulls: bool,
        /// Leave out resource ids
        #[arg(long)]
        no_id: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let output = match cli.command {
        Commands::Decode { input } => {
            let (serializer, document) = load(&input)?;
            describe_document(&serializer, &document)?
        }
        Commands::Encode {
            input,
            to_one,
            to_many,
            omit_nulls,
            no_id,
        } => {
            let (serializer, document) = load(&input)?;
            let options = SerializationOptions::default()
                .with_id(!no_id)
                .with_to_one(to_one)
                .with_to_many(to_many)
                .omit_null_values(omit_nulls);
            let primary: Vec<&dyn Resource> = document.primary().collect();
            serializer
                .serialize_resources_value(&primary, options)
                .context("failed to serialize primary data")?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load(input: &Input) -> Result<(Serializer, JsonApiDocument)> {
    let mut serializer = load_schema(&input.schema)?;
    if let Some(base_url) = &input.base_url {
        serializer = serializer.with_base_url(base_url.clone());
    }
    let bytes = std::fs::read(&input.document)
        .with_context(|| format!("failed to read {}", input.document.display()))?;
    let document = serializer
        .deserialize_data(&bytes, Vec::new())
        .with_context(|| format!("failed to decode {}", input.document.display()))?;
    Ok((serializer, document))
}

fn load_schema(path: &Path) -> Result<Serializer> {
    let config = SpineConfig::load(path)?;
    debug!(
        path = %path.display(),
        resource_types = config.resources.len(),
        "loaded schema"
    );
    config
        .build()
        .with_context(|| format!("invalid schema {}", path.display()))
}

fn identifier_json(identifier: &ResourceIdentifier) -> JsonValue {
    json!({ "type": identifier.resource_type, "id": identifier.id })
}

fn describe_document(serializer: &Serializer, document: &JsonApiDocument) -> Result<JsonValue> {
    let data = document
        .data
        .as_ref()
        .map(|handles| handles.iter().map(|h| h.index()).collect::<Vec<_>>());

    let resources = document
        .pool
        .iter()
        .map(|(handle, resource)| {
            let mut described = describe_resource(serializer, resource)?;
            described["handle"] = json!(handle.index());
            Ok(described)
        })
        .collect::<Result<Vec<_>>>()?;

    let links: Option<Map<String, JsonValue>> = document.links.as_ref().map(|links| {
        links
            .iter()
            .map(|(name, url)| (name.clone(), json!(url.as_str())))
            .collect()
    });

    Ok(json!({
        "data": data,
        "resources": resources,
        "errors": serde_json::to_value(&document.errors)?,
        "meta": document.meta,
        "links": links,
        "jsonapi": document.jsonapi,
    }))
}

fn describe_resource(serializer: &Serializer, resource: &dyn Resource) -> Result<JsonValue> {
    let mut attributes = Map::new();
    let mut relationships = Map::new();

    for field in resource.schema().fields() {
        let value = resource.value(&field.name);
        match (&field.kind, value) {
            (FieldKind::ToOne { .. }, Some(Value::ToOne(link))) => {
                relationships.insert(
                    field.name.clone(),
                    json!({
                        "linkage": link.linkage.as_ref().map(identifier_json),
                        "related": link.related_url.as_ref().map(|u| u.as_str()),
                    }),
                );
            }
            (FieldKind::ToMany { .. }, Some(Value::ToMany(collection))) => {
                relationships.insert(
                    field.name.clone(),
                    json!({
                        "loaded": collection.is_loaded(),
                        "members": collection.resources().iter().map(identifier_json).collect::<Vec<_>>(),
                        "linkage": collection
                            .linkage
                            .as_ref()
                            .map(|l| l.iter().map(identifier_json).collect::<Vec<_>>()),
                        "related": collection.resources_url().map(|u| u.as_str()),
                        "self": collection.link_url.as_ref().map(|u| u.as_str()),
                    }),
                );
            }
            (kind, _) if kind.is_relationship() => {}
            (_, Some(value)) => {
                let formatted = serializer.registry().format(&value, field)?;
                attributes.insert(field.name.clone(), formatted);
            }
            (_, None) => {}
        }
    }

    let core = resource.core();
    Ok(json!({
        "type": resource.resource_type(),
        "id": resource.id(),
        "loaded": resource.is_loaded(),
        "url": resource.url().map(|u| u.as_str()),
        "meta": core.meta,
        "attributes": attributes,
        "relationships": relationships,
        "unmodeled_relationships": core.relationships,
    }))
}
