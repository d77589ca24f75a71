//! Record traits.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::Result;
use crate::field::FieldDecl;
use crate::introspect::ID_FIELD;
use crate::value::Value;

/// A structure whose leaf fields map to table columns.
///
/// Implemented by `#[derive(Fields)]`. Lookups by name visit fields in the
/// same order as [`declare`](Self::declare), so the first declaration of a
/// name is the one read and written.
pub trait Fields {
    /// Appends one declaration per leaf field, splicing in flattened
    /// structures at their position.
    fn declare(decls: &mut Vec<FieldDecl>)
    where
        Self: Sized;

    /// Reads the field stored under column `name`, or `None` if there is none.
    fn get_field(&self, name: &str) -> Result<Option<Value>>;

    /// Writes `value` into the field stored under column `name`.
    ///
    /// Returns `false` when no field has that name.
    fn set_field(&mut self, name: &str, value: Value) -> Result<bool>;
}

/// A structure persisted as one row of its own table.
///
/// An identifier of `0` means the record has not been inserted yet.
pub trait Record: Fields {
    /// Human-readable label.
    fn title(&self) -> &str;

    /// Table name without prefix.
    fn name(&self) -> &str;

    fn id(&self) -> i64 {
        match self.get_field(ID_FIELD) {
            Ok(Some(value)) => i64::from_value(value).unwrap_or(0),
            _ => 0,
        }
    }

    /// Stores `id` in the `id` field.
    ///
    /// Returns `false` when the record has no `id` field or the field's type
    /// cannot hold `id`; the record is then left unchanged.
    fn set_id(&mut self, id: i64) -> bool {
        matches!(self.set_field(ID_FIELD, Value::Integer(id)), Ok(true))
    }
}

/// Base fields shared by most records: just the primary identifier.
///
/// Flatten it into a record with `#[field(flatten)]`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, crate::Fields,
)]
pub struct Object {
    pub id: i64,
}

/// Physical table name: `prefix` followed by the record's name.
pub fn table_name<R: Record + ?Sized>(prefix: &str, record: &R) -> String {
    format!("{prefix}{}", record.name())
}
