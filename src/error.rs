//! Error types for domain-store operations

use thiserror::Error;

/// Errors that can occur while persisting or querying domain objects
#[derive(Debug, Error)]
pub enum StoreError {
    /// A field value failed verification: null violation, kind mismatch,
    /// uniqueness violation, or a foreign-key subset-consistency conflict.
    #[error("invalid value for field '{field}' of class '{class}': {message}")]
    FieldValue {
        class: String,
        field: String,
        message: String,
    },

    #[error("no '{class}' object with key {key}")]
    NotFound { class: String, key: i64 },

    #[error("unknown domain class: {0}")]
    ClassResolution(String),

    /// SQL was requested for an object still carrying verification messages.
    #[error("'{class}' object cannot be written while carrying verification errors: {}", messages.join("; "))]
    Initialization {
        class: String,
        messages: Vec<String>,
    },

    /// A result row did not contain the expected primary-key column.
    #[error("expected primary-key column '{column}' missing from result row")]
    FieldMatch { column: String },

    #[error("invalid argument: {0}")]
    Argument(String),

    /// A schema registry failed validation while being built.
    #[error("invalid schema: {0}")]
    Schema(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("schema descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),
}

impl StoreError {
    pub fn field_value(
        class: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::FieldValue {
            class: class.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(class: impl Into<String>, key: i64) -> Self {
        Self::NotFound {
            class: class.into(),
            key,
        }
    }

    pub fn class_resolution(class: impl Into<String>) -> Self {
        Self::ClassResolution(class.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
