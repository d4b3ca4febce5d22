//! Data loading and table model
//!
//! CSV ingestion (plain or gzip), typed tables and the compression helper.

pub mod compress;
pub mod loader;
pub mod table;

pub use loader::{load_all, load_table};
pub use table::{Column, ColumnType, KeyValue, Schema, Table, Value};
