//! Store configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! prefix: app_
//! schema:
//!   tracking_table: __kk_go_scheme
//!   auto_increment: 1000
//!   snapshot_on_failure: true
//! ```
//!
//! Every key is optional; missing keys take their [`Default`] value.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{validate_prefix, validate_table_name};

/// Default name of the snapshot tracking table, shared with databases
/// installed by earlier deployments.
pub const DEFAULT_TRACKING_TABLE: &str = "__kk_go_scheme";

/// Settings for the schema installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Table holding one snapshot row per installed table.
    pub tracking_table: String,
    /// Initial identifier for newly created tables.
    pub auto_increment: Option<i64>,
    /// Persist the new snapshot even when applying a migration fails.
    ///
    /// A re-run then sees the table as up to date, so partially applied
    /// migrations are not retried. The failure itself is still returned.
    pub snapshot_on_failure: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            tracking_table: DEFAULT_TRACKING_TABLE.to_string(),
            auto_increment: None,
            snapshot_on_failure: true,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prepended to every record's table name.
    pub prefix: String,
    pub schema: SchemaConfig,
}

impl StoreConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be read, [`YamlError`](crate::StoreError::YamlError) if parsing
    /// fails, or a validation error for a bad prefix or tracking table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the prefix and tracking table name.
    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.prefix)?;
        validate_table_name(&self.schema.tracking_table)
    }
}
