//! Player feature pipeline
//!
//! players ⟕ appearance aggregates ⟕ latest valuation, plus age.

use crate::data::{load_table, Table};
use crate::features::{aggregate, compute_age, latest_by_key, merge_sequence, Aggregation};
use crate::Result;
use chrono::NaiveDate;
use std::path::Path;

/// Table and column names plus switches for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub player_key: String,
    pub players_table: String,
    pub appearances_table: String,
    pub valuations_table: String,
    /// Valuation date column
    pub date_column: String,
    /// Valuation amount column
    pub value_column: String,
    pub birth_column: String,
    /// `None` uses the fixed default, not today
    pub reference_date: Option<NaiveDate>,
    pub compute_age: bool,
    /// Fail instead of dropping players whose valuations have no usable date
    pub strict_valuations: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            player_key: "player_id".to_string(),
            players_table: "players".to_string(),
            appearances_table: "appearances".to_string(),
            valuations_table: "player_valuations".to_string(),
            date_column: "date".to_string(),
            value_column: "market_value_in_eur".to_string(),
            birth_column: "date_of_birth".to_string(),
            reference_date: None,
            compute_age: true,
            strict_valuations: false,
        }
    }
}

/// Appearance reductions: games played and card totals
pub fn player_aggregations() -> Vec<Aggregation> {
    vec![
        Aggregation::count("n_games", "game_id"),
        Aggregation::sum("total_yellow", "yellow_cards"),
        Aggregation::sum("total_red", "red_cards"),
    ]
}

/// Load the three source tables from `data_dir` and build the feature table
pub fn prepare_player_features<P: AsRef<Path>>(
    data_dir: P,
    options: &PipelineOptions,
) -> Result<Table> {
    let dir = data_dir.as_ref();
    log::info!("Loading tables from {}", dir.display());

    let players = load_table(dir, &options.players_table)?;
    let appearances = load_table(dir, &options.appearances_table)?;
    let valuations = load_table(dir, &options.valuations_table)?;

    build_player_features(&players, &appearances, &valuations, options)
}

/// Build the per-player feature table from already-loaded tables
pub fn build_player_features(
    players: &Table,
    appearances: &Table,
    valuations: &Table,
    options: &PipelineOptions,
) -> Result<Table> {
    let key = options.player_key.as_str();

    let stats = aggregate(appearances, key, &player_aggregations())?;
    log::info!("Aggregated appearances for {} players", stats.len());

    let selection = latest_by_key(
        valuations,
        key,
        &options.date_column,
        &[options.value_column.as_str()],
    )?;
    let latest = if options.strict_valuations {
        selection.into_strict()?
    } else {
        if !selection.unparseable_groups.is_empty() {
            log::warn!(
                "Dropping {} players whose valuations have no parseable '{}'",
                selection.unparseable_groups.len(),
                options.date_column
            );
        }
        selection.table
    };
    log::info!("Selected latest valuation for {} players", latest.len());

    // Both reduced tables are unique per key, so the row count stays put
    let merged = merge_sequence(&[players.clone(), stats, latest], key)?;

    let features = if options.compute_age {
        compute_age(&merged, &options.birth_column, options.reference_date)?
    } else {
        merged
    };

    log::info!(
        "Built feature table: {} rows, {} columns",
        features.len(),
        features.schema().len()
    );
    Ok(features)
}
