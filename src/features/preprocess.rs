//! Model-ready preprocessing
//!
//! Z-score scaling of numeric columns and one-hot encoding of categorical
//! ones. Both read a feature table and leave it unchanged.

use crate::data::{Column, ColumnType, KeyValue, Schema, Table, Value};
use crate::{FootballError, Result};
use std::collections::HashMap;

/// Per-column mean and standard deviation fitted on a matrix
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major data; population std as in the training stats
    pub fn fit(columns: Vec<String>, data: &[Vec<f64>]) -> Self {
        let width = columns.len();
        let n = data.len().max(1) as f64;

        let means: Vec<f64> = (0..width)
            .map(|j| data.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let stds = (0..width)
            .map(|j| {
                let m = means[j];
                let variance = data.iter().map(|r| (r[j] - m).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect();

        StandardScaler {
            columns,
            means,
            stds,
        }
    }

    /// Scale a row; constant columns map to 0
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(x, (m, s))| if *s > 0.0 { (x - m) / s } else { 0.0 })
            .collect()
    }

    pub fn inverse_transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(z, (m, s))| z * s + m)
            .collect()
    }
}

/// Fill nulls in `columns` with 0 and z-score them
///
/// Returns the scaled matrix (one row per table row) and the fitted scaler.
pub fn fill_null_and_scale(
    table: &Table,
    columns: &[&str],
) -> Result<(Vec<Vec<f64>>, StandardScaler)> {
    let indices = numeric_columns(table, columns)?;

    let raw: Vec<Vec<f64>> = table
        .rows()
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|&i| row[i].as_f64().unwrap_or(0.0))
                .collect()
        })
        .collect();

    let scaler = StandardScaler::fit(columns.iter().map(|c| c.to_string()).collect(), &raw);
    let scaled = raw.iter().map(|r| scaler.transform(r)).collect();
    Ok((scaled, scaler))
}

fn numeric_columns(table: &Table, columns: &[&str]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            let idx = table.column_index(name)?;
            match table.schema().columns()[idx].ty {
                ColumnType::Int | ColumnType::Float => Ok(idx),
                other => Err(FootballError::TypeMismatch {
                    column: name.to_string(),
                    expected: "numeric".to_string(),
                    found: other.to_string(),
                }),
            }
        })
        .collect()
}

/// Indicator columns `<column>_<category>` for each listed column
///
/// Categories appear in first-seen order. A null cell sets no indicator.
pub fn one_hot(table: &Table, columns: &[&str]) -> Result<Table> {
    let mut out_columns = Vec::new();
    // Per source column: (table index, category -> output offset)
    let mut encoders: Vec<(usize, HashMap<KeyValue, usize>)> = Vec::new();

    for name in columns {
        let idx = table.column_index(name)?;
        let mut categories = HashMap::new();
        for row in table.rows() {
            if let Some(key) = row[idx].key() {
                if !categories.contains_key(&key) {
                    categories.insert(key, out_columns.len());
                    out_columns.push(Column::new(
                        format!("{}_{}", name, row[idx].to_field()),
                        ColumnType::Float,
                    ));
                }
            }
        }
        encoders.push((idx, categories));
    }

    let width = out_columns.len();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let mut encoded = vec![Value::Float(0.0); width];
            for (idx, categories) in &encoders {
                if let Some(offset) = row[*idx].key().and_then(|k| categories.get(&k)) {
                    encoded[*offset] = Value::Float(1.0);
                }
            }
            encoded
        })
        .collect();

    Table::new(Schema::new(out_columns)?, rows)
}
