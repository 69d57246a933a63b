//! Validation messages produced while building objects.
//!
//! A [`ValidationLog`] is an append-only, ordered list of
//! [`ValidationMessage`]s. Builders return it with the built object (or with
//! the error that aborted the build) so callers can surface data-quality
//! issues. A build is valid when the log holds no [`Severity::Error`]
//! message.

use std::fmt;

use serde::Serialize;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a message applies. Rows are 0-based data row indices (the header
/// is not counted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Locator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_id: Option<String>,
}

impl Locator {
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_hole(mut self, hole_id: impl Into<String>) -> Self {
        self.hole_id = Some(hole_id.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_none() && self.row.is_none() && self.column.is_none() && self.hole_id.is_none()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(table) = &self.table {
            parts.push(format!("table '{table}'"));
        }
        if let Some(row) = self.row {
            parts.push(format!("row {row}"));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column '{column}'"));
        }
        if let Some(hole_id) = &self.hole_id {
            parts.push(format!("hole '{hole_id}'"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// One diagnostic emitted during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Locator::is_empty")]
    pub locator: Locator,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.locator.is_empty() {
            write!(f, "[{}] {}", self.severity, self.message)
        } else {
            write!(f, "[{}] {} ({})", self.severity, self.message, self.locator)
        }
    }
}

/// Ordered, append-only message sink for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationLog {
    messages: Vec<ValidationMessage>,
}

impl ValidationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>, locator: Locator) {
        self.messages.push(ValidationMessage {
            severity,
            message: message.into(),
            locator,
        });
    }

    pub fn info(&mut self, message: impl Into<String>, locator: Locator) {
        self.push(Severity::Info, message, locator);
    }

    pub fn warning(&mut self, message: impl Into<String>, locator: Locator) {
        self.push(Severity::Warning, message, locator);
    }

    pub fn error(&mut self, message: impl Into<String>, locator: Locator) {
        self.push(Severity::Error, message, locator);
    }

    /// Appends every message of `other`, keeping their order.
    pub fn extend(&mut self, other: ValidationLog) {
        self.messages.extend(other.messages);
    }

    /// All messages in emission order.
    #[must_use]
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    /// Messages with the given severity, in emission order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(move |m| m.severity == severity)
    }
}
