//! Conversions between primitive Rust types and driver values.
//!
//! Only the primitives listed here are stored in native columns; every
//! other field type goes through [`json`](crate::json).

use crate::error::{FieldError, Result};
use crate::field::SourceKind;
use crate::value::Value;

/// A primitive Rust type that maps to one native SQL column.
///
/// `NULL` reads back as the type's zero value. Numeric text is accepted
/// because several drivers return every column as text.
pub trait Column: Sized {
    /// Classification used to derive the SQL column type.
    const SOURCE: SourceKind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn integer(value: Value, target: &'static str) -> Result<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Integer(n) => Ok(n),
        Value::Real(f) if f.fract() == 0.0 => Ok(f as i64),
        Value::Text(ref s) => s.trim().parse().map_err(|_| FieldError::Parse {
            target,
            text: s.clone(),
        }),
        Value::Blob(ref b) => {
            let text = String::from_utf8_lossy(b);
            text.trim().parse().map_err(|_| FieldError::Parse {
                target,
                text: text.into_owned(),
            })
        }
        other => Err(FieldError::TypeMismatch {
            expected: target,
            found: other.type_name(),
        }),
    }
}

fn real(value: Value, target: &'static str) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Real(f) => Ok(f),
        Value::Integer(n) => Ok(n as f64),
        Value::Text(ref s) => s.trim().parse().map_err(|_| FieldError::Parse {
            target,
            text: s.clone(),
        }),
        Value::Blob(ref b) => {
            let text = String::from_utf8_lossy(b);
            text.trim().parse().map_err(|_| FieldError::Parse {
                target,
                text: text.into_owned(),
            })
        }
    }
}

macro_rules! integer_column {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Column for $t {
                const SOURCE: SourceKind = SourceKind::$kind;

                fn to_value(&self) -> Value {
                    Value::Integer(*self as i64)
                }

                fn from_value(value: Value) -> Result<Self> {
                    let n = integer(value, stringify!($t))?;
                    <$t>::try_from(n).map_err(|_| FieldError::OutOfRange {
                        target: stringify!($t),
                        value: n,
                    })
                }
            }
        )*
    };
}

integer_column!(
    i8 => Int,
    i16 => Int,
    i32 => Int,
    isize => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    usize => Int,
    i64 => BigInt,
);

// Values above i64::MAX travel through the driver by bit pattern.
impl Column for u64 {
    const SOURCE: SourceKind = SourceKind::BigInt;

    fn to_value(&self) -> Value {
        Value::Integer(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        integer(value, "u64").map(|n| n as u64)
    }
}

impl Column for f64 {
    const SOURCE: SourceKind = SourceKind::Float;

    fn to_value(&self) -> Value {
        Value::Real(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        real(value, "f64")
    }
}

impl Column for f32 {
    const SOURCE: SourceKind = SourceKind::Float;

    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        real(value, "f32").map(|f| f as f32)
    }
}

impl Column for bool {
    const SOURCE: SourceKind = SourceKind::Bool;

    fn to_value(&self) -> Value {
        Value::Integer(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        integer(value, "bool").map(|n| n != 0)
    }
}

impl Column for String {
    const SOURCE: SourceKind = SourceKind::String;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s),
            Value::Blob(b) => String::from_utf8(b).map_err(|_| FieldError::TypeMismatch {
                expected: "String",
                found: "non-UTF-8 blob",
            }),
            Value::Integer(n) => Ok(n.to_string()),
            Value::Real(f) => Ok(f.to_string()),
        }
    }
}

/// Encodes a primitive field. Used by generated `Fields` implementations.
#[doc(hidden)]
pub fn encode<T: Column>(field: &T) -> Result<Value> {
    Ok(field.to_value())
}

/// Decodes into a primitive field. Used by generated `Fields` implementations.
#[doc(hidden)]
pub fn assign<T: Column>(field: &mut T, value: Value) -> Result<()> {
    *field = T::from_value(value)?;
    Ok(())
}
