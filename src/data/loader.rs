//! CSV table loader
//!
//! Reads `<name>.csv` or `<name>.csv.gz` from a directory. Column names come
//! from the header row and column types are inferred from the data.

use crate::data::table::{parse_date, Column, ColumnType, Schema, Table, Value};
use crate::{FootballError, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CSV_SUFFIX: &str = ".csv";
const GZ_SUFFIX: &str = ".csv.gz";

/// Load one table by name, preferring the plain file over the gzip one
pub fn load_table<P: AsRef<Path>>(dir: P, name: &str) -> Result<Table> {
    let dir = dir.as_ref();
    let plain = dir.join(format!("{}{}", name, CSV_SUFFIX));
    let gzipped = dir.join(format!("{}{}", name, GZ_SUFFIX));

    let path = if plain.is_file() {
        plain
    } else if gzipped.is_file() {
        gzipped
    } else {
        return Err(FootballError::SourceNotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        });
    };

    let table = read_path(&path)?;
    log::info!(
        "Loaded table '{}': {} rows, {} columns",
        name,
        table.len(),
        table.schema().len()
    );
    Ok(table)
}

/// Load every `.csv` / `.csv.gz` file in a directory, keyed by base name
///
/// Other files are skipped.
pub fn load_all<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, Table>> {
    let mut tables = BTreeMap::new();

    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(name) = table_name(file_name) else {
            log::debug!("Skipping {}", path.display());
            continue;
        };

        let table = read_path(&path)?;
        log::info!(
            "Loaded table '{}': {} rows, {} columns",
            name,
            table.len(),
            table.schema().len()
        );
        tables.insert(name.to_string(), table);
    }

    Ok(tables)
}

/// Table name for a recognized file name (`players.csv.gz` -> `players`)
pub fn table_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(GZ_SUFFIX)
        .or_else(|| file_name.strip_suffix(CSV_SUFFIX))
        .filter(|name| !name.is_empty())
}

/// Read a single CSV file, decompressing by suffix
pub fn read_path(path: &Path) -> Result<Table> {
    log::debug!("Reading {}", path.display());
    let file = File::open(path)?;
    let is_gzip = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".gz"));

    if is_gzip {
        read_csv(GzDecoder::new(file), path)
    } else {
        read_csv(file, path)
    }
}

/// Parse CSV from any reader into a typed table
///
/// `path` is only used for error reporting.
pub fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.len() != headers.len() {
            return Err(FootballError::MalformedRecord {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }
        raw.push(record.iter().map(|f| f.to_string()).collect());
    }

    let types: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_type(raw.iter().map(|r| r[i].as_str())))
        .collect();

    let schema = Schema::new(
        headers
            .iter()
            .zip(&types)
            .map(|(name, ty)| Column::new(name.as_str(), *ty))
            .collect(),
    )?;

    let rows = raw
        .into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .zip(&types)
                .map(|(field, ty)| convert(field, *ty))
                .collect()
        })
        .collect();

    Table::new(schema, rows)
}

/// Narrowest type every non-empty field parses as
fn infer_type<'a>(fields: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut present = fields.filter(|f| !f.is_empty()).peekable();
    if present.peek().is_none() {
        return ColumnType::Text;
    }

    if present.clone().all(|f| f.parse::<i64>().is_ok()) {
        ColumnType::Int
    } else if present.clone().all(|f| f.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if present.all(|f| parse_date(f).is_some() && f.len() == 10) {
        ColumnType::Date
    } else {
        ColumnType::Text
    }
}

fn convert(field: String, ty: ColumnType) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    // Inference guarantees these parse; fall back to text rather than panic
    match ty {
        ColumnType::Int => field.parse().map(Value::Int).unwrap_or(Value::Text(field)),
        ColumnType::Float => field
            .parse()
            .map(Value::Float)
            .unwrap_or(Value::Text(field)),
        ColumnType::Date => parse_date(&field)
            .map(Value::Date)
            .unwrap_or(Value::Text(field)),
        ColumnType::Text => Value::Text(field),
    }
}
