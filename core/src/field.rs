//! Field declarations and the SQL column metadata derived from them.
//!
//! [`FieldDescriptor::from_decl`] holds the one mapping from a declared Rust
//! field to its SQL storage type and default expression. Statement building
//! and schema installation both consume descriptors; neither re-derives
//! types on its own.
//!
//! | Source kind | length | SQL type | default |
//! |---|---|---|---|
//! | 8–32 bit integer | 0 / n | `INT` / `INT(n)` | tag or `0` |
//! | 64-bit integer | 0 / n | `BIGINT` / `BIGINT(n)` | tag or `0` |
//! | float | 0 / n | `DOUBLE` / `DOUBLE(n)` | tag or `0` |
//! | bool | n/a | `INT(1)` | `1` or `0` |
//! | string | 0 | `VARCHAR(64)` | quoted tag |
//! | string | 1..=4096 | `VARCHAR(n)` | quoted tag |
//! | string | 4097..=65535 | `TEXT(n)` | none |
//! | string | > 65535 | `LONGTEXT(n)` | none |
//! | string | -1 | `TEXT` | none |
//! | string | -2 | `LONGTEXT` | none |
//! | anything else | 0 / n | `TEXT` / `TEXT(n)` | none, JSON-encoded |

/// Classification of a declared Rust field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Signed or unsigned integer of 8 to 32 bits, or pointer-sized.
    Int,
    /// 64-bit integer.
    BigInt,
    /// `f32` or `f64`.
    Float,
    Bool,
    String,
    /// Any other type; persisted as JSON text.
    Json,
}

/// Static declaration of one leaf field, emitted by `#[derive(Fields)]`.
///
/// Tags that were not given are empty strings and a zero length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    /// Rust identifier of the field.
    pub ident: &'static str,
    /// Resolved column name.
    pub name: &'static str,
    pub source: SourceKind,
    /// Length tag. `-1` and `-2` select unsized `TEXT` and `LONGTEXT` for strings.
    pub length: i64,
    /// Default tag, unparsed.
    pub default: &'static str,
    /// Index specification, e.g. `ASC`.
    pub index: &'static str,
}

/// Physical column category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Int,
    BigInt,
    Double,
    /// Physically `INT(1)`.
    Bool,
    /// `VARCHAR` with its effective length.
    VarString(u32),
    Text,
    LongText,
    /// `TEXT` holding a JSON document.
    Json,
}

const VARCHAR_DEFAULT_LEN: u32 = 64;
const VARCHAR_MAX_LEN: i64 = 4096;
const TEXT_MAX_LEN: i64 = 65535;

/// Derived metadata for one persisted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: StorageKind,
    /// Explicit length from the declaration, when it shows in the SQL type.
    pub size_hint: Option<i64>,
    /// Default expression without the `DEFAULT` keyword; empty for none.
    pub default_expr: String,
    pub index: Option<String>,
    pub is_json: bool,
}

impl FieldDescriptor {
    /// Derives the column metadata for a declared field.
    pub fn from_decl(decl: &FieldDecl) -> Self {
        let sized = (decl.length > 0).then_some(decl.length);

        let (kind, size_hint, default_expr) = match decl.source {
            SourceKind::Int => (StorageKind::Int, sized, integer_default(decl.default)),
            SourceKind::BigInt => (StorageKind::BigInt, sized, integer_default(decl.default)),
            SourceKind::Float => (StorageKind::Double, sized, float_default(decl.default)),
            SourceKind::Bool => (StorageKind::Bool, None, bool_default(decl.default)),
            SourceKind::String => match decl.length {
                -1 => (StorageKind::Text, None, String::new()),
                -2 => (StorageKind::LongText, None, String::new()),
                n if n > TEXT_MAX_LEN => (StorageKind::LongText, Some(n), String::new()),
                n if n > VARCHAR_MAX_LEN => (StorageKind::Text, Some(n), String::new()),
                n if n > 0 => (
                    StorageKind::VarString(n as u32),
                    Some(n),
                    quoted_default(decl.default),
                ),
                _ => (
                    StorageKind::VarString(VARCHAR_DEFAULT_LEN),
                    None,
                    quoted_default(decl.default),
                ),
            },
            SourceKind::Json => (StorageKind::Json, sized, String::new()),
        };

        let index = (!decl.index.is_empty()).then(|| decl.index.to_string());

        Self {
            name: decl.name.to_string(),
            kind,
            size_hint,
            default_expr,
            index,
            is_json: kind == StorageKind::Json,
        }
    }

    /// SQL column type, e.g. `VARCHAR(32)` or `BIGINT`.
    pub fn sql_type(&self) -> String {
        let sized = |base: &str| match self.size_hint {
            Some(n) => format!("{base}({n})"),
            None => base.to_string(),
        };
        match self.kind {
            StorageKind::Int => sized("INT"),
            StorageKind::BigInt => sized("BIGINT"),
            StorageKind::Double => sized("DOUBLE"),
            StorageKind::Bool => "INT(1)".to_string(),
            StorageKind::VarString(n) => format!("VARCHAR({n})"),
            StorageKind::Text | StorageKind::Json => sized("TEXT"),
            StorageKind::LongText => sized("LONGTEXT"),
        }
    }

    /// `DEFAULT <expr>`, or an empty string when the column has no default.
    pub fn default_clause(&self) -> String {
        if self.default_expr.is_empty() {
            String::new()
        } else {
            format!("DEFAULT {}", self.default_expr)
        }
    }

    /// Column definition as used in `CREATE TABLE` and `ALTER TABLE`.
    pub fn column_clause(&self) -> String {
        let mut clause = format!("`{}` {}", self.name, self.sql_type());
        if !self.default_expr.is_empty() {
            clause.push(' ');
            clause.push_str(&self.default_clause());
        }
        clause
    }
}

fn integer_default(tag: &str) -> String {
    tag.trim().parse::<i64>().unwrap_or(0).to_string()
}

fn float_default(tag: &str) -> String {
    let value = tag.trim().parse::<f64>().unwrap_or(0.0);
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

fn bool_default(tag: &str) -> String {
    let truthy = matches!(
        tag.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    );
    let expr = if truthy { "1" } else { "0" };
    expr.to_string()
}

fn quoted_default(tag: &str) -> String {
    format!("'{}'", tag.replace('\\', "\\\\").replace('\'', "''"))
}
