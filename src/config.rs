//! Pipeline configuration loaded from TOML.

use crate::domain::{Column, Pipeline};
use crate::error::{PipelineError, Result};
use crate::reorder::ReorderOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Rows written per upsert call unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Column the store resolves upsert conflicts on
pub const DEFAULT_CONFLICT_KEY: &str = "id";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub columns: Vec<Column>,
    pub batch_size: usize,
    pub conflict_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let pipeline = Pipeline::default();
        Self {
            name: pipeline.name,
            columns: pipeline.columns,
            batch_size: DEFAULT_BATCH_SIZE,
            conflict_key: DEFAULT_CONFLICT_KEY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        // Items tables are keyed by id only.
        if self.conflict_key != DEFAULT_CONFLICT_KEY {
            return Err(PipelineError::Config(format!(
                "unsupported conflict_key '{}', expected '{}'",
                self.conflict_key, DEFAULT_CONFLICT_KEY
            )));
        }
        if self.columns.is_empty() {
            return Err(PipelineError::Config(
                "at least one column is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if col.id.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "column '{}' has an empty id",
                    col.name
                )));
            }
            if !seen.insert(col.id.as_str()) {
                return Err(PipelineError::Config(format!(
                    "duplicate column id '{}'",
                    col.id
                )));
            }
        }
        Ok(())
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.name.clone(), self.columns.clone())
    }

    pub fn reorder_options(&self) -> ReorderOptions {
        ReorderOptions {
            batch_size: self.batch_size,
            conflict_key: self.conflict_key.clone(),
        }
    }
}
