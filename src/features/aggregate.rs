//! Per-key summary statistics
//!
//! Groups a table by one key column and reduces each group to counts and
//! sums, one output row per distinct non-null key.

use crate::data::{Column, ColumnType, KeyValue, Schema, Table, Value};
use crate::{FootballError, JoinSide, Result};
use std::collections::HashMap;

/// Reduction applied to a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFn {
    /// Number of non-null values
    Count,
    /// Sum of non-null values; 0 for an empty or all-null group
    Sum,
}

/// One output column of an aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub output: String,
    pub source: String,
    pub function: AggFn,
}

impl Aggregation {
    pub fn new(output: impl Into<String>, source: impl Into<String>, function: AggFn) -> Self {
        Aggregation {
            output: output.into(),
            source: source.into(),
            function,
        }
    }

    pub fn count(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(output, source, AggFn::Count)
    }

    pub fn sum(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(output, source, AggFn::Sum)
    }
}

/// Running state for one aggregation within one group
#[derive(Debug, Clone, Copy)]
enum Accumulator {
    Count(i64),
    IntSum(i64),
    FloatSum(f64),
}

impl Accumulator {
    fn update(&mut self, value: &Value, column: &str) -> Result<()> {
        match (self, value) {
            (_, Value::Null) => {}
            (Accumulator::Count(n), _) => *n += 1,
            (Accumulator::IntSum(s), Value::Int(v)) => {
                *s = s.checked_add(*v).ok_or_else(|| FootballError::SumOverflow {
                    column: column.to_string(),
                })?;
            }
            (Accumulator::FloatSum(s), v) => *s += v.as_f64().unwrap_or(0.0),
            (Accumulator::IntSum(_), _) => {}
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) | Accumulator::IntSum(n) => Value::Int(n),
            Accumulator::FloatSum(s) => Value::Float(s),
        }
    }
}

/// Group `table` by `group_key` and compute `aggregations` per group
///
/// Rows with a null key are skipped. Output rows follow first-seen key order;
/// columns are the key followed by each aggregation's output.
pub fn aggregate(table: &Table, group_key: &str, aggregations: &[Aggregation]) -> Result<Table> {
    let key_idx = table
        .schema()
        .index_of(group_key)
        .ok_or_else(|| FootballError::MissingJoinKey {
            key: group_key.to_string(),
            side: JoinSide::Input,
        })?;
    let key_column = table.schema().columns()[key_idx].clone();

    // Resolve sources and pick an accumulator per output up front
    let mut sources = Vec::with_capacity(aggregations.len());
    let mut templates = Vec::with_capacity(aggregations.len());
    let mut columns = vec![key_column];

    for agg in aggregations {
        let idx = table.column_index(&agg.source)?;
        let source_ty = table.schema().columns()[idx].ty;
        let (template, output_ty) = match (agg.function, source_ty) {
            (AggFn::Count, _) => (Accumulator::Count(0), ColumnType::Int),
            (AggFn::Sum, ColumnType::Int) => (Accumulator::IntSum(0), ColumnType::Int),
            (AggFn::Sum, ColumnType::Float) => (Accumulator::FloatSum(0.0), ColumnType::Float),
            (AggFn::Sum, other) => {
                return Err(FootballError::TypeMismatch {
                    column: agg.source.clone(),
                    expected: "numeric".to_string(),
                    found: other.to_string(),
                })
            }
        };
        sources.push(idx);
        templates.push(template);
        columns.push(Column::new(agg.output.as_str(), output_ty));
    }

    let mut order: Vec<Value> = Vec::new();
    let mut groups: HashMap<KeyValue, Vec<Accumulator>> = HashMap::new();

    for row in table.rows() {
        let Some(key) = row[key_idx].key() else {
            continue;
        };
        let accumulators = groups.entry(key).or_insert_with(|| {
            order.push(row[key_idx].clone());
            templates.clone()
        });
        for ((acc, &src), agg) in accumulators.iter_mut().zip(&sources).zip(aggregations) {
            acc.update(&row[src], &agg.source)?;
        }
    }

    let rows = order
        .into_iter()
        .map(|key_value| {
            let accumulators = key_value
                .key()
                .and_then(|k| groups.get(&k))
                .cloned()
                .unwrap_or_else(|| templates.clone());
            std::iter::once(key_value)
                .chain(accumulators.into_iter().map(Accumulator::finish))
                .collect()
        })
        .collect::<Vec<Vec<Value>>>();

    log::debug!(
        "Aggregated {} rows by '{}' into {} groups",
        table.len(),
        group_key,
        rows.len()
    );

    Table::new(Schema::new(columns)?, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_appearances(rows: &[(Option<i64>, i64, Option<i64>, i64)]) -> Table {
        Table::from_columns(
            &[
                ("player_id", ColumnType::Int),
                ("game_id", ColumnType::Int),
                ("yellow_cards", ColumnType::Int),
                ("red_cards", ColumnType::Int),
            ],
            rows.iter()
                .map(|(p, g, y, r)| {
                    vec![
                        p.map(Value::Int).unwrap_or(Value::Null),
                        Value::Int(*g),
                        y.map(Value::Int).unwrap_or(Value::Null),
                        Value::Int(*r),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    fn player_aggregations() -> Vec<Aggregation> {
        vec![
            Aggregation::count("n_games", "game_id"),
            Aggregation::sum("total_yellow", "yellow_cards"),
            Aggregation::sum("total_red", "red_cards"),
        ]
    }

    #[test]
    fn test_counts_and_card_sums() {
        let appearances = make_appearances(&[
            (Some(7), 1, Some(1), 0),
            (Some(7), 2, Some(0), 0),
            (Some(7), 3, Some(1), 0),
        ]);

        let stats = aggregate(&appearances, "player_id", &player_aggregations()).unwrap();
        assert_eq!(
            stats.column_names(),
            vec!["player_id", "n_games", "total_yellow", "total_red"]
        );
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.value(0, "n_games").unwrap(), &Value::Int(3));
        assert_eq!(stats.value(0, "total_yellow").unwrap(), &Value::Int(2));
        assert_eq!(stats.value(0, "total_red").unwrap(), &Value::Int(0));
    }

    #[test]
    fn test_all_zero_and_all_null_groups_sum_to_zero() {
        let appearances = make_appearances(&[
            (Some(1), 10, Some(0), 0),
            (Some(1), 11, Some(0), 0),
            (Some(2), 12, None, 0),
        ]);

        let stats = aggregate(&appearances, "player_id", &player_aggregations()).unwrap();
        assert_eq!(stats.value(0, "total_yellow").unwrap(), &Value::Int(0));
        assert_eq!(stats.value(0, "total_red").unwrap(), &Value::Int(0));
        // Null is skipped, not propagated
        assert_eq!(stats.value(1, "total_yellow").unwrap(), &Value::Int(0));
    }

    #[test]
    fn test_first_seen_order_and_null_keys() {
        let appearances = make_appearances(&[
            (Some(5), 1, Some(0), 0),
            (None, 2, Some(1), 1),
            (Some(3), 3, Some(1), 0),
            (Some(5), 4, Some(1), 1),
        ]);

        let stats = aggregate(&appearances, "player_id", &player_aggregations()).unwrap();
        let keys: Vec<_> = stats.column_values("player_id").unwrap();
        assert_eq!(keys, vec![&Value::Int(5), &Value::Int(3)]);
        assert_eq!(stats.value(0, "n_games").unwrap(), &Value::Int(2));
        assert_eq!(stats.value(0, "total_red").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_count_skips_nulls() {
        let appearances = make_appearances(&[(Some(1), 1, None, 0), (Some(1), 2, Some(2), 0)]);
        let stats = aggregate(
            &appearances,
            "player_id",
            &[Aggregation::count("carded", "yellow_cards")],
        )
        .unwrap();
        assert_eq!(stats.value(0, "carded").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_float_sum() {
        let table = Table::from_columns(
            &[("player_id", ColumnType::Int), ("minutes", ColumnType::Float)],
            vec![
                vec![Value::Int(1), Value::Float(45.5)],
                vec![Value::Int(1), Value::Int(30)],
            ],
        )
        .unwrap();

        let stats = aggregate(&table, "player_id", &[Aggregation::sum("minutes", "minutes")])
            .unwrap();
        assert_eq!(stats.value(0, "minutes").unwrap(), &Value::Float(75.5));
    }

    #[test]
    fn test_int_sum_overflow() {
        let appearances = make_appearances(&[
            (Some(1), 1, Some(i64::MAX), 0),
            (Some(1), 2, Some(1), 0),
        ]);
        let err = aggregate(&appearances, "player_id", &player_aggregations()).unwrap_err();
        assert!(matches!(err, FootballError::SumOverflow { column } if column == "yellow_cards"));
    }

    #[test]
    fn test_misconfiguration_errors() {
        let appearances = make_appearances(&[(Some(1), 1, Some(0), 0)]);

        assert!(matches!(
            aggregate(&appearances, "club_id", &player_aggregations()),
            Err(FootballError::MissingJoinKey {
                side: JoinSide::Input,
                ..
            })
        ));
        assert!(matches!(
            aggregate(
                &appearances,
                "player_id",
                &[Aggregation::sum("goals", "goals")]
            ),
            Err(FootballError::MissingColumn(_))
        ));

        let text = Table::from_columns(
            &[("player_id", ColumnType::Int), ("name", ColumnType::Text)],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            aggregate(&text, "player_id", &[Aggregation::sum("x", "name")]),
            Err(FootballError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_identity_aggregation_roundtrip() {
        use crate::features::merge::{join, JoinMode};

        let players = Table::from_columns(
            &[("player_id", ColumnType::Int), ("name", ColumnType::Text)],
            vec![
                vec![Value::Int(1), Value::Text("Ada".into())],
                vec![Value::Int(2), Value::Text("Bo".into())],
                vec![Value::Int(1), Value::Text("Ada again".into())],
            ],
        )
        .unwrap();

        let keys = aggregate(&players, "player_id", &[]).unwrap();
        assert_eq!(keys.column_names(), vec!["player_id"]);
        assert_eq!(keys.len(), 2);

        let merged = join(&players, &keys, "player_id", JoinMode::LeftOuter).unwrap();
        assert_eq!(merged, players);
    }
}
