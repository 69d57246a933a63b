//! CSV reader producing [`Table`]s.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use log::debug;

use crate::error::{SourcePosition, TableError, TableResult};
use crate::table::Table;

/// Options for reading CSV sources
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Column delimiter (default: b',')
    pub delimiter: u8,
    /// Whether to trim surrounding whitespace from headers and fields (default: true)
    pub trim: bool,
    /// Extra tokens treated as missing in addition to empty cells (default: none)
    pub null_values: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
            null_values: Vec::new(),
        }
    }
}

impl CsvReadOptions {
    /// Create new read options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set column delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether fields are trimmed
    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Add a token that is read as a missing cell (e.g. `"NA"`, `"-999"`)
    #[must_use]
    pub fn with_null_value(mut self, token: impl Into<String>) -> Self {
        self.null_values.push(token.into());
        self
    }

    fn is_null(&self, cell: &str) -> bool {
        cell.trim().is_empty() || self.null_values.iter().any(|token| token == cell)
    }
}

/// Read a CSV file into a [`Table`].
///
/// # Errors
///
/// Returns [`TableError::NotFound`] when the file does not exist,
/// [`TableError::Malformed`] when the content cannot form a rectangular table,
/// and [`TableError::Io`] for any other I/O failure.
pub fn read_csv_table(path: impl AsRef<Path>, options: &CsvReadOptions) -> TableResult<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => TableError::NotFound {
            path: path.to_path_buf(),
        },
        _ => TableError::Io {
            source,
            context: Some(path.display().to_string()),
        },
    })?;

    let table = read_csv_from_reader(file, options, &path.display().to_string())?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Read CSV content from any reader into a [`Table`].
///
/// `context` names the source in error messages.
///
/// # Errors
///
/// Returns [`TableError::Malformed`] when there is no header row, the header
/// repeats a name, or a record has a different number of fields than the
/// header. I/O failures of the reader map to [`TableError::Io`].
pub fn read_csv_from_reader<R: Read>(
    reader: R,
    options: &CsvReadOptions,
    context: &str,
) -> TableResult<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(if options.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| TableError::from_csv(e, context))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(TableError::Malformed {
            message: "source has no header row".to_string(),
            position: Some(SourcePosition {
                line: Some(1),
                ..SourcePosition::default()
            }),
            context: Some(context.to_string()),
        });
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| TableError::from_csv(e, context))?;
        let row = record
            .iter()
            .map(|cell| (!options.is_null(cell)).then(|| cell.to_string()))
            .collect();
        rows.push(row);
    }

    Table::from_raw(headers, rows).map_err(|e| e.with_additional_context(context))
}
