//! Equality joins between tables
//!
//! Left-outer join on a single key column, and a left fold of that join over
//! a list of tables.

use crate::data::{Column, KeyValue, Schema, Table, Value};
use crate::{FootballError, JoinSide, Result};
use std::collections::HashMap;

/// Suffix for the left copy of a colliding column
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix for the right copy of a colliding column
pub const RIGHT_SUFFIX: &str = "_y";

/// Join mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Keep every left row; unmatched rows get null right columns
    #[default]
    LeftOuter,
}

/// Join `left` with `right` on `key`
///
/// Each left row is emitted once per matching right row, in right-table order.
/// A left row without a match (or with a null key) is emitted once with every
/// right column null. The key column appears once, at its left position.
/// Non-key columns present on both sides are renamed `<name>_x` / `<name>_y`.
pub fn join(left: &Table, right: &Table, key: &str, mode: JoinMode) -> Result<Table> {
    let JoinMode::LeftOuter = mode;

    let left_key = left
        .schema()
        .index_of(key)
        .ok_or_else(|| missing_key(key, JoinSide::Left))?;
    let right_key = right
        .schema()
        .index_of(key)
        .ok_or_else(|| missing_key(key, JoinSide::Right))?;

    let schema = joined_schema(left.schema(), right.schema(), key)?;

    // Right rows grouped by key, preserving row order within each group
    let mut index: HashMap<KeyValue, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(k) = row[right_key].key() {
            index.entry(k).or_default().push(i);
        }
    }

    let right_width = right.schema().len() - 1;
    let mut rows = Vec::with_capacity(left.len());

    for left_row in left.rows() {
        let matches = left_row[left_key]
            .key()
            .and_then(|k| index.get(&k))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if matches.is_empty() {
            let mut row = left_row.clone();
            row.extend(std::iter::repeat(Value::Null).take(right_width));
            rows.push(row);
            continue;
        }

        for &m in matches {
            let mut row = left_row.clone();
            row.extend(
                right.rows()[m]
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != right_key)
                    .map(|(_, v)| v.clone()),
            );
            rows.push(row);
        }
    }

    log::debug!(
        "Joined on '{}': {} left rows -> {} rows",
        key,
        left.len(),
        rows.len()
    );

    Table::new(schema, rows)
}

/// Left-fold [`join`] over `tables`, starting from the first one
pub fn merge_sequence(tables: &[Table], key: &str) -> Result<Table> {
    let (first, rest) = tables.split_first().ok_or(FootballError::EmptyMergeList)?;
    rest.iter().try_fold(first.clone(), |acc, table| {
        join(&acc, table, key, JoinMode::LeftOuter)
    })
}

fn missing_key(key: &str, side: JoinSide) -> FootballError {
    FootballError::MissingJoinKey {
        key: key.to_string(),
        side,
    }
}

/// Left columns, then right columns without the key; collisions get suffixes
fn joined_schema(left: &Schema, right: &Schema, key: &str) -> Result<Schema> {
    let collides = |name: &str| name != key && left.contains(name) && right.contains(name);

    let mut columns: Vec<Column> = left
        .columns()
        .iter()
        .map(|c| {
            if collides(&c.name) {
                Column::new(format!("{}{}", c.name, LEFT_SUFFIX), c.ty)
            } else {
                c.clone()
            }
        })
        .collect();

    columns.extend(right.columns().iter().filter(|c| c.name != key).map(|c| {
        if collides(&c.name) {
            Column::new(format!("{}{}", c.name, RIGHT_SUFFIX), c.ty)
        } else {
            c.clone()
        }
    }));

    Schema::new(columns)
}
