//! In-memory rectangular tables with per-column type inference.
//!
//! A [`Table`] is an ordered list of named [`Column`]s that all hold the same
//! number of rows. Each column carries a single inferred [`ColumnType`], and
//! every cell is a [`CellValue`]. Empty cells are kept as
//! [`CellValue::Missing`] so that "absent" and "zero" are never confused.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{SourcePosition, TableError, TableResult};

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-empty value parses as a finite number.
    Numeric,
    /// Every non-empty value parses as an ISO-8601 date or date-time.
    Timestamp,
    /// Anything else.
    Text,
}

impl ColumnType {
    /// Returns the string representation of this column type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// The cell was empty in the source.
    Missing,
    /// A finite number.
    Number(f64),
    /// A date or date-time without time zone (zoned inputs are normalised to UTC).
    Timestamp(NaiveDateTime),
    /// Free text.
    Text(String),
}

impl CellValue {
    /// Returns true when the cell was empty in the source.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric view of the cell.
    ///
    /// Text cells are parsed, so a text column holding `"12.5"` in one row
    /// still yields a number for that row.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => parse_number(text),
            CellValue::Missing | CellValue::Timestamp(_) => None,
        }
    }

    /// Text view of the cell, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

/// Formats a timestamp as ISO-8601 without zone suffix.
#[must_use]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Parses a finite number; `NaN` and infinities are rejected.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses an ISO-8601 date or date-time.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Infers the type of a column from its raw (non-missing) values.
///
/// A column with no values at all is numeric.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a str> + Clone) -> ColumnType {
    if values.clone().into_iter().all(|v| parse_number(v).is_some()) {
        ColumnType::Numeric
    } else if values.into_iter().all(|v| parse_timestamp(v).is_some()) {
        ColumnType::Timestamp
    } else {
        ColumnType::Text
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: ColumnType,
    values: Vec<CellValue>,
    // source text per row, kept for identifiers such as `0012`
    raw: Vec<Option<String>>,
}

impl Column {
    /// Builds a column from raw text cells, inferring its type.
    ///
    /// `None` cells become [`CellValue::Missing`].
    #[must_use]
    pub fn from_raw(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        let data_type = infer_column_type(raw.iter().flatten().map(String::as_str));
        let values = raw
            .iter()
            .map(|cell| match cell {
                None => CellValue::Missing,
                Some(text) => convert_cell(text.clone(), data_type),
            })
            .collect();
        Self {
            name: name.into(),
            data_type,
            values,
            raw,
        }
    }

    /// Builds a column from already typed cells; their display form stands
    /// in for the source text.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: ColumnType, values: Vec<CellValue>) -> Self {
        let raw = values
            .iter()
            .map(|cell| (!cell.is_missing()).then(|| cell.to_string()))
            .collect();
        Self {
            name: name.into(),
            data_type,
            values,
            raw,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data_type(&self) -> ColumnType {
        self.data_type
    }

    #[must_use]
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at `row`, if the row exists.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&CellValue> {
        self.values.get(row)
    }

    /// Source text of the cell at `row`, before type conversion.
    ///
    /// `None` for missing cells and rows past the end.
    #[must_use]
    pub fn raw(&self, row: usize) -> Option<&str> {
        self.raw.get(row).and_then(Option::as_deref)
    }

    /// Number of missing cells.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

fn convert_cell(text: String, data_type: ColumnType) -> CellValue {
    match data_type {
        ColumnType::Numeric => parse_number(&text).map_or(CellValue::Text(text), CellValue::Number),
        ColumnType::Timestamp => parse_timestamp(&text).map_or(CellValue::Text(text), CellValue::Timestamp),
        ColumnType::Text => CellValue::Text(text),
    }
}

/// An ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Assembles a table from columns.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Malformed`] when two columns share a name or the
    /// columns do not all have the same number of rows.
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        let mut seen = HashSet::new();
        for (index, column) in columns.iter().enumerate() {
            if !seen.insert(column.name()) {
                return Err(TableError::Malformed {
                    message: format!("duplicate column name '{}'", column.name()),
                    position: Some(SourcePosition::field_in_record(1, index as u64 + 1)),
                    context: None,
                });
            }
        }

        let row_count = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|c| c.len() != row_count) {
            return Err(TableError::malformed(format!(
                "column '{}' has {} rows, expected {row_count}",
                column.name(),
                column.len()
            )));
        }

        Ok(Self { columns, row_count })
    }

    /// Builds a table from a header and row-major raw cells.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Malformed`] for duplicate or empty header names
    /// and for rows whose length differs from the header.
    pub fn from_raw(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> TableResult<Self> {
        if let Some(index) = headers.iter().position(|h| h.trim().is_empty()) {
            return Err(TableError::Malformed {
                message: "empty column name".to_string(),
                position: Some(SourcePosition::field_in_record(1, index as u64 + 1)),
                context: None,
            });
        }

        let mut raw_columns: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(TableError::Malformed {
                    message: format!(
                        "inconsistent row length: expected {} fields, found {}",
                        headers.len(),
                        row.len()
                    ),
                    // header is record 1
                    position: Some(SourcePosition {
                        record: Some(row_index as u64 + 2),
                        ..SourcePosition::default()
                    }),
                    context: None,
                });
            }
            for (column, cell) in raw_columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();
        Self::new(columns)
    }

    /// Convenience constructor from string cells; blank cells are missing.
    ///
    /// # Errors
    ///
    /// Same as [`Table::from_raw`].
    pub fn from_text_rows<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>]) -> TableResult<Self> {
        let headers = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let cell = cell.as_ref().trim();
                        (!cell.is_empty()).then(|| cell.to_string())
                    })
                    .collect()
            })
            .collect();
        Self::from_raw(headers, rows)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks a column up by exact name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The first `max_rows` rows, row-major.
    #[must_use]
    pub fn head(&self, max_rows: usize) -> Vec<Vec<&CellValue>> {
        (0..self.row_count.min(max_rows))
            .map(|row| self.columns.iter().map(|c| &c.values[row]).collect())
            .collect()
    }
}
