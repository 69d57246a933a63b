//! Tabular source adapter: loads CSV-shaped input into typed, rectangular
//! [`Table`]s and reports missing or malformed sources as [`TableError`]s.

pub mod error;
pub mod reader;
pub mod table;

pub use error::{SourcePosition, TableError, TableResult};
pub use reader::{CsvReadOptions, read_csv_from_reader, read_csv_table};
pub use table::{
    CellValue, Column, ColumnType, Table, format_timestamp, infer_column_type, parse_number,
    parse_timestamp,
};
