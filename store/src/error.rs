//! Error types for store operations.
//!
//! Driver failures are carried unchanged inside [`StoreError::DriverError`];
//! callers can downcast the boxed source to the driver's own error type.

use rowmap_core::FieldError;
use thiserror::Error;

/// Errors that can occur while executing statements or installing schemas.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure reported by the database capability.
    #[error("database error: {0}")]
    DriverError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A field could not be converted to or from a driver value.
    #[error("field '{column}': {source}")]
    FieldError {
        column: String,
        #[source]
        source: FieldError,
    },

    /// A schema snapshot could not be serialized or parsed.
    #[error("snapshot error: {0}")]
    SnapshotError(#[from] serde_json::Error),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only ASCII alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Tracking table name is empty or contains invalid characters.
    #[error("invalid tracking table name '{0}'")]
    InvalidTableName(String),

    /// Configuration file could not be read or written.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration YAML could not be parsed or serialized.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl StoreError {
    /// Wraps a driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DriverError(Box::new(err))
    }

    pub(crate) fn field(column: impl Into<String>, source: FieldError) -> Self {
        Self::FieldError {
            column: column.into(),
            source,
        }
    }

    /// Returns the driver error of type `E`, if this is one.
    pub fn driver_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::DriverError(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
