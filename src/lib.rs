//! Football player feature tables
//!
//! Loads player, appearance and valuation extracts and folds them into one
//! denormalized row per player: appearance counts, card totals, latest market
//! value and age.

pub mod data;
pub mod features;
pub mod pipeline;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use data::{Table, Value};
pub use pipeline::PipelineOptions;

/// Reference date used for ages when the caller does not pass one
pub const DEFAULT_REFERENCE_DATE: &str = "2025-05-27";

/// Which table was missing the key: a join side, or the single input of a
/// grouping operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
    Input,
}

impl std::fmt::Display for JoinSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
            JoinSide::Input => write!(f, "input"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootballError {
    #[error("No table named '{name}' in {}", .dir.display())]
    SourceNotFound { name: String, dir: PathBuf },

    #[error("Malformed record in {} at line {line}: expected {expected} fields, found {found}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Key column '{key}' missing from {side} table")]
    MissingJoinKey { key: String, side: JoinSide },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Group {key} has rows but no parseable date")]
    EmptyGroup { key: String },

    #[error("Cannot merge an empty list of tables")]
    EmptyMergeList,

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Row {row} has {found} values, schema has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' has {expected} values, table has {found} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} out of range for table with {len} rows")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Sum of '{column}' overflows a 64-bit integer")]
    SumOverflow { column: String },

    #[error("Column '{column}' expects {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, FootballError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub player_key: String,
    pub players_table: String,
    pub appearances_table: String,
    pub valuations_table: String,
    pub date_column: String,
    pub value_column: String,
    pub birth_column: String,
    /// `YYYY-MM-DD`
    pub reference_date: String,
    pub compute_age: bool,
    pub strict_valuations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = PipelineOptions::default();
        Config {
            data: DataConfig {
                directory: "data".to_string(),
            },
            pipeline: PipelineConfig {
                player_key: options.player_key,
                players_table: options.players_table,
                appearances_table: options.appearances_table,
                valuations_table: options.valuations_table,
                date_column: options.date_column,
                value_column: options.value_column,
                birth_column: options.birth_column,
                reference_date: DEFAULT_REFERENCE_DATE.to_string(),
                compute_age: options.compute_age,
                strict_valuations: options.strict_valuations,
            },
            output: OutputConfig {
                path: "output/player_features.csv".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootballError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FootballError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootballError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Pipeline options with the reference date parsed
    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let p = &self.pipeline;
        let reference_date = NaiveDate::parse_from_str(&p.reference_date, "%Y-%m-%d")
            .map_err(|e| {
                FootballError::Config(format!(
                    "Invalid reference_date '{}': {}",
                    p.reference_date, e
                ))
            })?;

        Ok(PipelineOptions {
            player_key: p.player_key.clone(),
            players_table: p.players_table.clone(),
            appearances_table: p.appearances_table.clone(),
            valuations_table: p.valuations_table.clone(),
            date_column: p.date_column.clone(),
            value_column: p.value_column.clone(),
            birth_column: p.birth_column.clone(),
            reference_date: Some(reference_date),
            compute_age: p.compute_age,
            strict_valuations: p.strict_valuations,
        })
    }
}

/// The fixed default reference date as a `NaiveDate`
pub fn default_reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 27).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.pipeline.reference_date = "2024-02-29".to_string();
        config.pipeline.strict_valuations = true;
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded, config);

        let options = loaded.pipeline_options().unwrap();
        assert_eq!(options.reference_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(options.strict_valuations);
    }

    #[test]
    fn test_invalid_reference_date() {
        let mut config = Config::default();
        config.pipeline.reference_date = "27/05/2025".to_string();
        assert!(matches!(
            config.pipeline_options(),
            Err(FootballError::Config(_))
        ));
    }

    #[test]
    fn test_default_reference_date_matches_constant() {
        assert_eq!(
            default_reference_date().format("%Y-%m-%d").to_string(),
            DEFAULT_REFERENCE_DATE
        );
    }

    #[test]
    fn test_input_side_display() {
        let err = FootballError::MissingJoinKey {
            key: "player_id".to_string(),
            side: JoinSide::Input,
        };
        assert_eq!(
            err.to_string(),
            "Key column 'player_id' missing from input table"
        );
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            Config::load("/nonexistent/config.toml"),
            Err(FootballError::Config(_))
        ));
    }
}
