//! Error types for value conversion.
//!
//! Every conversion between a live field and a driver [`Value`](crate::Value)
//! reports failures through [`FieldError`].

use thiserror::Error;

/// Errors that can occur while converting a field to or from a driver value.
#[derive(Debug, Error)]
pub enum FieldError {
    /// The driver value has a variant the field cannot hold.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An integer does not fit the field's Rust type.
    #[error("value {value} out of range for {target}")]
    OutOfRange { target: &'static str, value: i64 },

    /// Text returned by the driver could not be parsed as the field's type.
    #[error("cannot parse {text:?} as {target}")]
    Parse { target: &'static str, text: String },

    /// A JSON-kind field could not be serialized.
    #[error("JSON encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// A JSON-kind column held text that is not valid JSON for the field.
    #[error("JSON decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FieldError {
    /// Returns `true` for failures covered by the lenient read policy.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Convenience alias for results with [`FieldError`].
pub type Result<T> = std::result::Result<T, FieldError>;
