//! Typed in-memory tables
//!
//! A [`Table`] is an ordered list of rows sharing a named, typed [`Schema`].
//! Every table is validated when it is built, so later lookups by column name
//! fail with a typed error instead of silently producing nothing.

use crate::{FootballError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Formats accepted when reading a date out of a text cell
const DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
    Date,
}

impl ColumnType {
    /// Whether a value may be stored in a column of this type
    ///
    /// Null fits everywhere; integers are accepted by float columns.
    pub fn admits(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ColumnType::Int, Value::Int(_))
                | (ColumnType::Float, Value::Float(_) | Value::Int(_))
                | (ColumnType::Text, Value::Text(_))
                | (ColumnType::Date, Value::Date(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Date => write!(f, "date"),
        }
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::Null => "null",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar date
    ///
    /// Text is accepted as `YYYY-MM-DD` or as an ISO datetime whose time part
    /// is discarded. Anything else yields `None`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s),
            _ => None,
        }
    }

    /// Hashable form used for joining and grouping; `None` for null
    pub fn key(&self) -> Option<KeyValue> {
        match self {
            Value::Int(v) => Some(KeyValue::Int(*v)),
            Value::Float(v) => {
                if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Some(KeyValue::Int(*v as i64))
                } else {
                    Some(KeyValue::Float(v.to_bits()))
                }
            }
            Value::Text(s) => Some(KeyValue::Text(s.clone())),
            Value::Date(d) => Some(KeyValue::Date(*d)),
            Value::Null => None,
        }
    }

    /// Render the cell the way it is written to CSV (null is empty)
    pub fn to_field(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Null => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::from(s.as_str()),
            Value::Date(d) => serde_json::Value::from(d.format("%Y-%m-%d").to_string()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_field()),
        }
    }
}

/// Equality key for a cell; integral floats collapse onto integers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Int(i64),
    Float(u64),
    Text(String),
    Date(NaiveDate),
}

/// Parse a date cell, dropping any time component
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Column {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered column list for a table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema, rejecting duplicate column names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(FootballError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Schema { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// A materialized table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking row widths and cell types against the schema
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(FootballError::RowWidth {
                    row: row_idx,
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (column, value) in schema.columns().iter().zip(row) {
                if !column.ty.admits(value) {
                    return Err(FootballError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.ty.to_string(),
                        found: value.kind().to_string(),
                    });
                }
            }
        }
        Ok(Table { schema, rows })
    }

    /// Convenience constructor from `(name, type)` pairs
    pub fn from_columns(columns: &[(&str, ColumnType)], rows: Vec<Vec<Value>>) -> Result<Self> {
        let schema = Schema::new(
            columns
                .iter()
                .map(|(name, ty)| Column::new(*name, *ty))
                .collect(),
        )?;
        Table::new(schema, rows)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names().collect()
    }

    /// Position of a column, or `MissingColumn`
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| FootballError::MissingColumn(name.to_string()))
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        let idx = self.column_index(name)?;
        Ok(self.schema.columns()[idx].ty)
    }

    /// Cell at `(row, column name)`
    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .map(|r| &r[idx])
            .ok_or(FootballError::RowOutOfRange {
                row,
                len: self.rows.len(),
            })
    }

    /// All cells of one column, in row order
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// New table holding only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Result<Vec<_>>>()?;
        let schema = Schema::new(
            indices
                .iter()
                .map(|&i| self.schema.columns()[i].clone())
                .collect(),
        )?;
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Table { schema, rows })
    }

    /// New table with `column` appended, or replaced if it already exists
    pub fn with_column(&self, column: Column, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(FootballError::ColumnLength {
                column: column.name,
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        let mut columns = self.schema.columns().to_vec();
        let existing = self.schema.index_of(&column.name);
        match existing {
            Some(i) => columns[i] = column,
            None => columns.push(column),
        }

        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                match existing {
                    Some(i) => row[i] = value,
                    None => row.push(value),
                }
                row
            })
            .collect();

        Table::new(Schema::new(columns)?, rows)
    }

    /// Write the table as CSV with a header row, creating parent directories
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record(self.schema.names())?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Value::to_field))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let object = self
                    .schema
                    .names()
                    .zip(row)
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect()
    }
}
