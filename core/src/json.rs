//! Conversions for fields stored as JSON text.
//!
//! Any field that is not a [`Column`](crate::Column) primitive is persisted
//! as the `serde_json` serialization of its value. Reads are lenient: a
//! `NULL`, empty, or malformed column leaves the field at its default value.
//! Malformed input is still reported as [`FieldError::Decode`] so callers can
//! record the degradation instead of losing it.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{FieldError, Result};
use crate::value::Value;

/// Serializes a JSON-kind field into the text bound as a statement parameter.
pub fn encode<T: Serialize + ?Sized>(field: &T) -> Result<Value> {
    serde_json::to_string(field)
        .map(Value::Text)
        .map_err(FieldError::Encode)
}

/// Decodes a JSON-kind column into `field`.
///
/// On any failure `field` is reset to `T::default()` before the error is
/// returned.
pub fn assign<T: DeserializeOwned + Default>(field: &mut T, value: Value) -> Result<()> {
    let bytes = match value {
        Value::Null => {
            *field = T::default();
            return Ok(());
        }
        Value::Text(s) => s.into_bytes(),
        Value::Blob(b) => b,
        Value::Integer(n) => n.to_string().into_bytes(),
        Value::Real(f) => f.to_string().into_bytes(),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        *field = T::default();
        return Ok(());
    }

    match serde_json::from_slice(&bytes) {
        Ok(decoded) => {
            *field = decoded;
            Ok(())
        }
        Err(e) => {
            *field = T::default();
            Err(FieldError::Decode(e))
        }
    }
}
