use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// A position within a tabular source, such as a CSV record.
///
/// All indices are 1-based where possible to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number in the source (1-based)
    pub line: Option<u64>,
    /// Logical record number, counting the header as record 1
    pub record: Option<u64>,
    /// Field number within the record (1-based)
    pub field: Option<u64>,
    /// Byte offset from the start of the source
    pub byte_offset: Option<u64>,
}

impl SourcePosition {
    /// Position of a single field inside a record.
    #[must_use]
    pub fn field_in_record(record: u64, field: u64) -> Self {
        Self {
            record: Some(record),
            field: Some(field),
            ..Self::default()
        }
    }

    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none()
            && self.record.is_none()
            && self.field.is_none()
            && self.byte_offset.is_none()
    }
}

impl From<&csv::Position> for SourcePosition {
    fn from(pos: &csv::Position) -> Self {
        Self {
            line: Some(pos.line()),
            record: Some(pos.record() + 1),
            field: None,
            byte_offset: Some(pos.byte()),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }
        if let Some(field) = self.field {
            parts.push(format!("field {field}"));
        }
        if let Some(byte) = self.byte_offset {
            parts.push(format!("byte {byte}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors that can occur when loading a table from a tabular source.
#[derive(Debug)]
pub enum TableError {
    /// The source does not exist.
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },
    /// The source exists but its structure cannot be turned into a table.
    Malformed {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// An underlying I/O failure occurred.
    Io {
        /// The originating error.
        source: std::io::Error,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
}

impl TableError {
    /// Shorthand for a [`TableError::Malformed`] without position.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            position: None,
            context: None,
        }
    }

    fn fmt_context(context: Option<&str>) -> String {
        context
            .map(|c| format!(" while reading {c}"))
            .unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position
            .filter(|pos| !pos.is_empty())
            .map(|pos| format!(" at {pos}"))
            .unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            TableError::Malformed {
                context: existing, ..
            }
            | TableError::Io {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            TableError::NotFound { .. } => {},
        }
        self
    }

    /// Returns true for the "source not found" failure mode.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, TableError::NotFound { .. })
    }

    pub(crate) fn from_csv(err: csv::Error, context: &str) -> Self {
        let position = err.position().map(SourcePosition::from);
        let message = err.to_string();
        let context = Some(context.to_string());
        match err.into_kind() {
            csv::ErrorKind::Io(source) => TableError::Io { source, context },
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => TableError::Malformed {
                message: format!("inconsistent row length: expected {expected_len} fields, found {len}"),
                position,
                context,
            },
            csv::ErrorKind::Utf8 { err, .. } => TableError::Malformed {
                message: format!("invalid UTF-8 in field {}", err.field() + 1),
                position: position.map(|p| SourcePosition {
                    field: Some(err.field() as u64 + 1),
                    ..p
                }),
                context,
            },
            _ => TableError::Malformed {
                message,
                position,
                context,
            },
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::NotFound { path } => {
                write!(f, "Source not found: '{}'", path.display())
            },
            TableError::Malformed {
                message,
                position,
                context,
            } => write!(
                f,
                "Malformed source{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            TableError::Io { source, context } => {
                write!(
                    f,
                    "I/O error{}: {source}",
                    Self::fmt_context(context.as_deref())
                )
            },
        }
    }
}

impl StdError for TableError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TableError::Io { source, .. } => Some(source),
            TableError::NotFound { .. } | TableError::Malformed { .. } => None,
        }
    }
}

/// Result type alias that uses [`TableError`].
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_source_position() {
        let pos = SourcePosition {
            line: Some(10),
            field: Some(3),
            ..SourcePosition::default()
        };

        assert_eq!(pos.to_string(), "line 10, field 3");
        assert_eq!(SourcePosition::default().to_string(), "unknown position");
    }

    #[test]
    fn display_malformed_error_with_context() {
        let error = TableError::Malformed {
            message: "inconsistent row length: expected 3 fields, found 2".to_string(),
            position: Some(SourcePosition {
                line: Some(5),
                record: Some(5),
                ..Default::default()
            }),
            context: Some("collars.csv".to_string()),
        };

        assert_eq!(
            error.to_string(),
            "Malformed source while reading collars.csv at line 5, record 5: inconsistent row length: expected 3 fields, found 2"
        );
    }

    #[test]
    fn additional_context_is_appended() {
        let error = TableError::malformed("no header row")
            .with_additional_context("survey.csv")
            .with_additional_context("downhole collection");

        assert_eq!(
            error.to_string(),
            "Malformed source while reading survey.csv; downhole collection: no header row"
        );
    }

    #[test]
    fn not_found_ignores_context() {
        let error = TableError::NotFound {
            path: PathBuf::from("missing.csv"),
        }
        .with_additional_context("points");

        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Source not found: 'missing.csv'");
    }
}
