//! Error types for the Spine resource model.

use thiserror::Error;

/// Result type for resource model operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the resource model itself.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown field '{field}' on resource type '{resource_type}'")]
    UnknownField {
        resource_type: String,
        field: String,
    },

    #[error("duplicate field '{field}' on resource type '{resource_type}'")]
    DuplicateField {
        resource_type: String,
        field: String,
    },

    #[error("invalid value for field '{field}': expected {expected}, got {actual}")]
    InvalidFieldValue {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("resource of type '{0}' has no id and cannot be used as linkage")]
    MissingId(String),
}
