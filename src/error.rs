//! Error types for conversion and enhancement

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors that abort a conversion or enhancement run.
///
/// Per-type and per-property anomalies (missing facets, unrecoverable raw
/// patterns, ambiguous lookups) never surface here; they are logged and
/// recorded in the run's audit trail instead.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Structural violation in schema '{schema}': {reason}")]
    Structure { schema: String, reason: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid type system: {0}")]
    InvalidTypeSystem(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Build a structural violation for the named schema
    pub fn structure(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structure {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}
