//! Latest-record selection per key
//!
//! For each group, keeps the row with the greatest date. Rows whose date does
//! not parse stay in the table but can never be selected.
//!
//! Exact date ties go to the row that appears first in the input.

use crate::data::{Column, KeyValue, Schema, Table, Value};
use crate::{FootballError, JoinSide, Result};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Result of [`latest_by_key`]
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSelection {
    /// One row per group that had a parseable date, in first-seen group order
    pub table: Table,
    /// Groups that had rows but no parseable date
    pub unparseable_groups: Vec<Value>,
}

impl LatestSelection {
    /// Treat any group without a winner as an error
    pub fn into_strict(self) -> Result<Table> {
        match self.unparseable_groups.first() {
            Some(key) => Err(FootballError::EmptyGroup {
                key: key.to_string(),
            }),
            None => Ok(self.table),
        }
    }
}

/// Resolved column positions shared by both selection entry points
struct Layout {
    key_idx: usize,
    date_idx: usize,
    output: Vec<usize>,
    schema: Schema,
}

impl Layout {
    fn resolve(
        table: &Table,
        group_key: &str,
        date_column: &str,
        value_columns: &[&str],
    ) -> Result<Self> {
        let key_idx =
            table
                .schema()
                .index_of(group_key)
                .ok_or_else(|| FootballError::MissingJoinKey {
                    key: group_key.to_string(),
                    side: JoinSide::Input,
                })?;
        let date_idx = table.column_index(date_column)?;

        let mut output = vec![key_idx];
        for name in value_columns {
            let idx = table.column_index(name)?;
            if !output.contains(&idx) {
                output.push(idx);
            }
        }

        let schema = Schema::new(
            output
                .iter()
                .map(|&i| table.schema().columns()[i].clone())
                .collect::<Vec<Column>>(),
        )?;

        Ok(Layout {
            key_idx,
            date_idx,
            output,
            schema,
        })
    }

    fn project(&self, row: &[Value]) -> Vec<Value> {
        self.output.iter().map(|&i| row[i].clone()).collect()
    }
}

/// Per-group state: first-seen key value and the current winner
struct Group {
    key: Value,
    best: Option<(NaiveDate, usize)>,
}

/// Pick, for each `group_key`, the row with the latest `date_column`
///
/// The returned table holds `group_key` followed by `value_columns`. Groups
/// whose rows all have unparseable dates are listed separately instead of
/// being silently dropped.
pub fn latest_by_key(
    table: &Table,
    group_key: &str,
    date_column: &str,
    value_columns: &[&str],
) -> Result<LatestSelection> {
    let layout = Layout::resolve(table, group_key, date_column, value_columns)?;

    let mut order: Vec<Group> = Vec::new();
    let mut positions: HashMap<KeyValue, usize> = HashMap::new();

    for (i, row) in table.rows().iter().enumerate() {
        let Some(key) = row[layout.key_idx].key() else {
            continue;
        };
        let pos = *positions.entry(key).or_insert_with(|| {
            order.push(Group {
                key: row[layout.key_idx].clone(),
                best: None,
            });
            order.len() - 1
        });

        if let Some(date) = row[layout.date_idx].as_date() {
            let group = &mut order[pos];
            // Strictly greater: an equal date never displaces an earlier row
            if group.best.map_or(true, |(best, _)| date > best) {
                group.best = Some((date, i));
            }
        }
    }

    let mut rows = Vec::new();
    let mut unparseable_groups = Vec::new();
    for group in order {
        match group.best {
            Some((_, i)) => rows.push(layout.project(&table.rows()[i])),
            None => unparseable_groups.push(group.key),
        }
    }

    if !unparseable_groups.is_empty() {
        log::debug!(
            "{} groups in '{}' have no parseable '{}'",
            unparseable_groups.len(),
            group_key,
            date_column
        );
    }

    Ok(LatestSelection {
        table: Table::new(layout.schema, rows)?,
        unparseable_groups,
    })
}

/// Latest row for a single requested group
///
/// `Ok(None)` means the group has no rows at all; `Err(EmptyGroup)` means it
/// has rows but none with a parseable date.
pub fn latest_for_key(
    table: &Table,
    group_key: &str,
    date_column: &str,
    value_columns: &[&str],
    key: &Value,
) -> Result<Option<Vec<Value>>> {
    let layout = Layout::resolve(table, group_key, date_column, value_columns)?;
    let Some(wanted) = key.key() else {
        return Ok(None);
    };

    let mut seen = false;
    let mut best: Option<(NaiveDate, &[Value])> = None;

    for row in table.rows() {
        if row[layout.key_idx].key().as_ref() != Some(&wanted) {
            continue;
        }
        seen = true;
        if let Some(date) = row[layout.date_idx].as_date() {
            if best.map_or(true, |(b, _)| date > b) {
                best = Some((date, row.as_slice()));
            }
        }
    }

    match (seen, best) {
        (false, _) => Ok(None),
        (true, None) => Err(FootballError::EmptyGroup {
            key: key.to_string(),
        }),
        (true, Some((_, row))) => Ok(Some(layout.project(row))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;

    fn make_valuations(rows: &[(i64, &str, i64)]) -> Table {
        Table::from_columns(
            &[
                ("player_id", ColumnType::Int),
                ("date", ColumnType::Text),
                ("market_value_in_eur", ColumnType::Int),
                ("club_id", ColumnType::Int),
            ],
            rows.iter()
                .map(|(p, d, v)| {
                    vec![
                        Value::Int(*p),
                        Value::Text(d.to_string()),
                        Value::Int(*v),
                        Value::Int(99),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    const VALUE_COLUMNS: [&str; 1] = ["market_value_in_eur"];

    #[test]
    fn test_latest_date_wins() {
        let vals = make_valuations(&[(9, "2021-06-01", 2_000_000), (9, "2020-01-01", 1_000_000)]);

        let selection = latest_by_key(&vals, "player_id", "date", &VALUE_COLUMNS).unwrap();
        assert!(selection.unparseable_groups.is_empty());
        let latest = selection.table;
        assert_eq!(latest.column_names(), vec!["player_id", "market_value_in_eur"]);
        assert_eq!(latest.len(), 1);
        assert_eq!(
            latest.value(0, "market_value_in_eur").unwrap(),
            &Value::Int(2_000_000)
        );
    }

    #[test]
    fn test_ties_go_to_first_row() {
        let vals = make_valuations(&[
            (4, "2019-01-01", 10),
            (4, "2022-07-01", 20),
            (4, "2022-07-01", 30),
        ]);

        let latest = latest_by_key(&vals, "player_id", "date", &VALUE_COLUMNS)
            .unwrap()
            .table;
        assert_eq!(latest.value(0, "market_value_in_eur").unwrap(), &Value::Int(20));
    }

    #[test]
    fn test_unparseable_dates_cannot_win() {
        let vals = make_valuations(&[
            (1, "garbage", 500),
            (1, "2018-03-03", 100),
            (2, "", 7),
            (2, "n/a", 8),
        ]);

        let selection = latest_by_key(&vals, "player_id", "date", &VALUE_COLUMNS).unwrap();
        assert_eq!(selection.table.len(), 1);
        assert_eq!(
            selection.table.value(0, "market_value_in_eur").unwrap(),
            &Value::Int(100)
        );
        assert_eq!(selection.unparseable_groups, vec![Value::Int(2)]);

        assert!(matches!(
            selection.into_strict(),
            Err(FootballError::EmptyGroup { key }) if key == "2"
        ));
    }

    #[test]
    fn test_first_seen_group_order() {
        let vals = make_valuations(&[
            (3, "2020-01-01", 1),
            (1, "2020-01-01", 2),
            (3, "2021-01-01", 3),
        ]);

        let latest = latest_by_key(&vals, "player_id", "date", &VALUE_COLUMNS)
            .unwrap()
            .into_strict()
            .unwrap();
        let keys = latest.column_values("player_id").unwrap();
        assert_eq!(keys, vec![&Value::Int(3), &Value::Int(1)]);
        assert_eq!(latest.value(0, "market_value_in_eur").unwrap(), &Value::Int(3));
    }

    #[test]
    fn test_native_date_column() {
        let d = |y, m, day| Value::Date(NaiveDate::from_ymd_opt(y, m, day).unwrap());
        let vals = Table::from_columns(
            &[("player_id", ColumnType::Int), ("date", ColumnType::Date)],
            vec![
                vec![Value::Int(1), d(2020, 1, 1)],
                vec![Value::Int(1), d(2020, 12, 31)],
                vec![Value::Int(1), Value::Null],
            ],
        )
        .unwrap();

        let latest = latest_by_key(&vals, "player_id", "date", &["date"])
            .unwrap()
            .table;
        assert_eq!(latest.value(0, "date").unwrap(), &d(2020, 12, 31));
    }

    #[test]
    fn test_key_listed_in_value_columns_once() {
        let vals = make_valuations(&[(1, "2020-01-01", 5)]);
        let latest = latest_by_key(&vals, "player_id", "date", &["player_id", "market_value_in_eur"])
            .unwrap()
            .table;
        assert_eq!(latest.column_names(), vec!["player_id", "market_value_in_eur"]);
    }

    #[test]
    fn test_missing_columns() {
        let vals = make_valuations(&[]);
        assert!(matches!(
            latest_by_key(&vals, "team_id", "date", &VALUE_COLUMNS),
            Err(FootballError::MissingJoinKey {
                side: JoinSide::Input,
                ..
            })
        ));
        assert!(matches!(
            latest_by_key(&vals, "player_id", "valued_on", &VALUE_COLUMNS),
            Err(FootballError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_requested_group_absent_vs_unparseable() {
        let vals = make_valuations(&[(1, "bad", 5), (2, "2020-05-05", 6)]);

        let absent =
            latest_for_key(&vals, "player_id", "date", &VALUE_COLUMNS, &Value::Int(3)).unwrap();
        assert_eq!(absent, None);

        let unparseable = latest_for_key(&vals, "player_id", "date", &VALUE_COLUMNS, &Value::Int(1));
        assert!(matches!(unparseable, Err(FootballError::EmptyGroup { .. })));

        let found =
            latest_for_key(&vals, "player_id", "date", &VALUE_COLUMNS, &Value::Int(2)).unwrap();
        assert_eq!(found, Some(vec![Value::Int(2), Value::Int(6)]));
    }
}
