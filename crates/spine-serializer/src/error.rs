//! Error types for serialization and deserialization.

use spine_core::CoreError;
use thiserror::Error;

/// Result type for serializer operations.
pub type Result<T> = std::result::Result<T, SerializerError>;

/// Errors returned by the deserializer, the serializer, and the resource factory.
#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("invalid document structure: the top level must be a JSON object")]
    InvalidDocumentStructure,

    #[error("document must contain at least one of 'data', 'errors' or 'meta'")]
    TopLevelEntryMissing,

    #[error("'data' and 'errors' must not coexist in the same document")]
    TopLevelDataAndErrorsCoexist,

    #[error("invalid resource object: {0}")]
    InvalidResourceStructure(String),

    #[error("resource object is missing its 'type'")]
    ResourceTypeMissing,

    #[error("resource object of type '{0}' is missing its 'id'")]
    ResourceIdMissing(String),

    #[error("resource type '{0}' is not registered")]
    ResourceTypeUnregistered(String),

    #[error("value of field '{field}' cannot be encoded as an attribute")]
    UnencodableValue { field: String },

    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[source] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SerializerError {
    /// True for violations of the document or resource-object shape.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidJson(_)
                | Self::InvalidDocumentStructure
                | Self::TopLevelEntryMissing
                | Self::TopLevelDataAndErrorsCoexist
                | Self::InvalidResourceStructure(_)
                | Self::ResourceTypeMissing
                | Self::ResourceIdMissing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_human_readable_messages() {
        let msg = SerializerError::ResourceTypeUnregistered("widgets".to_string()).to_string();
        assert!(msg.contains("widgets"));

        let msg = SerializerError::TopLevelDataAndErrorsCoexist.to_string();
        assert!(msg.contains("data"));
        assert!(msg.contains("errors"));
    }

    #[test]
    fn structural_errors_are_classified() {
        assert!(SerializerError::TopLevelEntryMissing.is_structural());
        assert!(SerializerError::ResourceIdMissing("foos".to_string()).is_structural());
        assert!(!SerializerError::ResourceTypeUnregistered("foos".to_string()).is_structural());
        assert!(!SerializerError::Config("bad".to_string()).is_structural());
    }
}
