//! Record model and field introspection for rowmap.
//!
//! This crate defines what a persisted record looks like to the rest of the
//! workspace:
//!
//! - [`Value`]: the closed set of values exchanged with a SQL driver.
//! - [`Column`]: conversions between primitive Rust types and [`Value`].
//! - [`json`]: conversions for fields stored as JSON text.
//! - [`Fields`] / [`Record`]: the traits generated by
//!   `#[derive(Fields, Record)]`.
//! - [`FieldDescriptor`] / [`FieldSet`]: the derived per-column metadata
//!   (SQL type, default, index) consumed by statement building and schema
//!   installation.
//!
//! # Example
//!
//! ```
//! use rowmap_core::{Fields, Object, Record, StorageKind, describe};
//!
//! #[derive(Debug, Default, Fields, Record)]
//! #[record(name = "user", title = "Users")]
//! struct User {
//!     #[field(flatten)]
//!     base: Object,
//!     #[field(length = 32)]
//!     name: String,
//!     #[field(default = 18, index = "ASC")]
//!     age: i32,
//!     active: bool,
//! }
//!
//! let fields = describe::<User>();
//! assert_eq!(fields.names(), vec!["id", "name", "age", "active"]);
//! assert_eq!(fields.get("name").unwrap().sql_type(), "VARCHAR(32)");
//! assert_eq!(fields.get("active").unwrap().kind, StorageKind::Bool);
//!
//! let mut user = User::default();
//! user.set_id(7);
//! assert_eq!(user.id(), 7);
//! assert_eq!(user.name(), "user");
//! ```

extern crate self as rowmap_core;

mod column;
mod error;
mod field;
mod introspect;
pub mod json;
mod record;
mod value;

pub use column::Column;
pub use error::{FieldError, Result};
pub use field::{FieldDecl, FieldDescriptor, SourceKind, StorageKind};
pub use introspect::{FieldSet, ID_FIELD, describe, describe_fields};
pub use record::{Fields, Object, Record, table_name};
pub use value::Value;

pub use rowmap_derive::{Fields, Record};

/// Support items referenced by code generated from `#[derive(Fields)]`.
#[doc(hidden)]
pub mod __private {
    pub use crate::column::{assign, encode};
    pub use crate::json;
}
