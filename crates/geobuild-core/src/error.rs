//! Custom error types for `GeoBuild` operations.
//!
//! Row-level data-quality problems never surface here: builders record them
//! as [`ValidationMessage`](crate::messages::ValidationMessage)s and carry on.
//! The errors below are the fatal ones that stop a build or a store call.

use std::path::PathBuf;

use tabular_csv::TableError;
use thiserror::Error;

use crate::messages::{Locator, ValidationLog};

/// Main error type for `GeoBuild` operations.
///
/// Uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoBuildError {
    /// A source table is missing or unparsable
    #[error(transparent)]
    Source(#[from] TableError),

    /// A mapped column does not exist in its table
    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),

    /// The source map or column mapping is malformed or incomplete
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Object type or schema problems
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Object store failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One mapped column that could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    /// Logical role (e.g. `"x"`, `"collar.id"`)
    pub role: String,
    /// Column name the role was mapped to, `None` when the role was not mapped
    pub column: Option<String>,
    /// Table the column was expected in
    pub table: Option<String>,
}

impl MissingColumn {
    fn describe(&self) -> String {
        match (&self.column, &self.table) {
            (Some(column), Some(table)) => {
                format!("column '{column}' for role '{}' not found in table '{table}'", self.role)
            },
            (Some(column), None) => format!("column '{column}' for role '{}' not found", self.role),
            (None, _) => format!("required role '{}' is not mapped", self.role),
        }
    }
}

/// A build aborted because required columns are absent.
///
/// Carries every missing column (all are checked before aborting) plus the
/// messages emitted up to that point, one `Error` per missing column.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", missing_summary(missing))]
pub struct MissingColumnError {
    missing: Vec<MissingColumn>,
    messages: ValidationLog,
}

fn missing_summary(missing: &[MissingColumn]) -> String {
    let details: Vec<_> = missing.iter().map(MissingColumn::describe).collect();
    format!("Missing required columns: {}", details.join("; "))
}

impl MissingColumnError {
    /// Wraps the collected missing columns and the log of the aborted build.
    #[must_use]
    pub fn new(missing: Vec<MissingColumn>, messages: ValidationLog) -> Self {
        Self { missing, messages }
    }

    /// Error for roles that were never mapped, detected before any table is
    /// read. Each role gets one `Error` message.
    #[must_use]
    pub fn from_roles<S: AsRef<str>>(roles: &[S]) -> Self {
        let mut messages = ValidationLog::new();
        let missing = roles
            .iter()
            .map(|role| {
                let missing = MissingColumn {
                    role: role.as_ref().to_string(),
                    column: None,
                    table: None,
                };
                messages.error(missing.describe(), Locator::default());
                missing
            })
            .collect();
        Self { missing, messages }
    }

    #[must_use]
    pub fn missing(&self) -> &[MissingColumn] {
        &self.missing
    }

    /// Messages emitted by the aborted build.
    #[must_use]
    pub fn messages(&self) -> &ValidationLog {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> ValidationLog {
        self.messages
    }
}

/// Problems with the source map or column mapping documents.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The document is not valid JSON or has the wrong shape
    #[error("Invalid {document}: {message}")]
    Invalid {
        /// Which document (e.g. "column mapping", "source map")
        document: String,
        /// What is wrong with it
        message: String,
    },

    /// A table the object type needs has no source handle
    #[error("No source given for table '{table}'")]
    MissingSource {
        /// The table purpose (e.g. "points", "collar")
        table: String,
    },

    /// An interval set has a source but no column mapping, or the reverse
    #[error("Interval set '{name}' has a {present} but no {absent}")]
    UnpairedIntervalSet {
        /// The interval set name
        name: String,
        /// What was given
        present: String,
        /// What is missing
        absent: String,
    },
}

impl MappingError {
    /// Shorthand for [`MappingError::Invalid`].
    #[must_use]
    pub fn invalid(document: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            document: document.to_string(),
            message: message.into(),
        }
    }
}

/// Object type and schema errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The object type is unknown or has no registered schema
    #[error("Object type '{name}' is not supported. Available types: {available}")]
    UnsupportedObjectType {
        /// The requested type name
        name: String,
        /// Comma-separated list of buildable types
        available: String,
    },

    /// The projected payload could not be serialized
    #[error("Failed to serialize {object_type} payload: {source}")]
    Serialization {
        /// The object type being projected
        object_type: String,
        /// The underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Object store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested object (or version) does not exist
    #[error("Object not found: {object}{}", version.as_ref().map(|v| format!(" (version {v})")).unwrap_or_default())]
    NotFound {
        /// The object reference as displayed
        object: String,
        /// The requested version, if any
        version: Option<String>,
    },

    /// Reading from or writing to a local store failed
    #[error("Failed to access object store at '{path}': {source}")]
    Access {
        /// The store path involved
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote or local store rejected the request
    #[error("Object store request failed: {source}")]
    Request {
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    /// Wraps an error returned by an [`ObjectStore`](geobuild_core_common::ObjectStore) call.
    #[must_use]
    pub fn request(err: anyhow::Error) -> Self {
        Self::Request { source: err.into() }
    }
}

/// Configuration errors.
///
/// These errors occur when request options or configuration are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },
}

/// Type alias for Results using `GeoBuildError`.
pub type Result<T> = std::result::Result<T, GeoBuildError>;

impl GeoBuildError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(e) => format!("Could not load source table: {e}"),
            Self::MissingColumn(e) => {
                let lines: Vec<_> = e.missing().iter().map(|m| format!("  - {}", m.describe())).collect();
                format!("Required columns are missing:\n{}", lines.join("\n"))
            },
            Self::Mapping(e) => e.to_string(),
            Self::Schema(e) => e.user_message(),
            Self::Store(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Source(e) if e.is_not_found() => Some(
                "Check that the file path is correct, or set --data-dir to the directory holding it."
                    .to_string(),
            ),
            Self::Source(_) => {
                Some("Run 'geobuild preview <FILE>' to inspect the table structure.".to_string())
            },
            Self::MissingColumn(_) => Some(
                "Check the column mapping against the table headers shown by 'geobuild preview'."
                    .to_string(),
            ),
            Self::Schema(SchemaError::UnsupportedObjectType { .. }) => {
                Some("Run 'geobuild schemas' to see all buildable object types.".to_string())
            },
            Self::Store(StoreError::NotFound { .. }) => {
                Some("Check the object id or path and the version.".to_string())
            },
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable by changing the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Mapping(_) | Self::MissingColumn(_)
        )
    }

    /// Validation messages attached to the error, if the build got far
    /// enough to emit any.
    #[must_use]
    pub fn messages(&self) -> Option<&ValidationLog> {
        match self {
            Self::MissingColumn(e) => Some(e.messages()),
            _ => None,
        }
    }
}

impl SchemaError {
    fn user_message(&self) -> String {
        match self {
            Self::UnsupportedObjectType { name, available } => {
                format!(
                    "Object type '{name}' is not supported.\n\nAvailable types:\n{}",
                    available
                        .split(", ")
                        .map(|t| format!("  - {t}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::Serialization { .. } => self.to_string(),
        }
    }
}

/// Helper to create `SchemaError::UnsupportedObjectType` listing the
/// buildable types.
#[must_use]
pub fn unsupported_object_type(name: &str) -> SchemaError {
    use crate::schemas::get_supported_schema_names;

    SchemaError::UnsupportedObjectType {
        name: name.to_string(),
        available: get_supported_schema_names().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Severity;

    #[test]
    fn test_missing_roles_become_error_messages() {
        let err = MissingColumnError::from_roles(&["x", "z"]);

        assert_eq!(err.missing().len(), 2);
        assert_eq!(err.messages().count(Severity::Error), 2);
        assert_eq!(
            err.to_string(),
            "Missing required columns: required role 'x' is not mapped; required role 'z' is not mapped"
        );
    }

    #[test]
    fn test_unsupported_type_lists_available() {
        let err = GeoBuildError::from(unsupported_object_type("triangle-mesh"));
        let text = err.to_string();
        assert!(text.contains("'triangle-mesh'"));
        assert!(text.contains("pointset"));
        assert!(!text.contains("regular-3d-grid"));
        assert!(err.recovery_suggestion().unwrap().contains("geobuild schemas"));
        assert!(err.user_message().contains("  - downhole-collection"));
    }

    #[test]
    fn test_source_not_found_suggestion() {
        let err = GeoBuildError::from(TableError::NotFound {
            path: PathBuf::from("missing.csv"),
        });
        assert!(err.recovery_suggestion().unwrap().contains("--data-dir"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_store_not_found_display() {
        let err = StoreError::NotFound {
            object: "path /a.json".to_string(),
            version: Some("3".to_string()),
        };
        assert_eq!(err.to_string(), "Object not found: path /a.json (version 3)");
    }
}
