//! Object builders.
//!
//! Each builder consumes one or more [`Table`]s plus its typed column
//! mapping and returns a [`Built`] object together with the messages of
//! that build. Builders hold no state between calls.
//!
//! Every mapped column is checked first; if any is absent the build aborts
//! with a [`MissingColumnError`] carrying one `Error` message per column.
//! Row-level problems are recorded as messages and the offending rows are
//! skipped.

mod downhole_collection;
mod downhole_intervals;
mod line_segments;
mod pointset;

pub use downhole_collection::{
    DesurveyedHoles, DownholeCollection, DownholeCollectionBuilder, Hole, desurvey_holes,
};
pub use downhole_intervals::{DownholeIntervals, DownholeIntervalsBuilder, Interval};
pub use line_segments::{LineSegments, LineSegmentsBuilder, Segment};
pub use pointset::{Pointset, PointsetBuilder};

use tabular_csv::{CellValue, Table};

use crate::error::{MissingColumn, MissingColumnError};
use crate::mapping::AttributeSelection;
use crate::messages::{Locator, ValidationLog};
use crate::types::{AttributeDef, Point3};

/// A built object plus the messages emitted while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Built<T> {
    object: T,
    messages: ValidationLog,
}

impl<T> Built<T> {
    #[must_use]
    pub fn new(object: T, messages: ValidationLog) -> Self {
        Self { object, messages }
    }

    #[must_use]
    pub fn object(&self) -> &T {
        &self.object
    }

    #[must_use]
    pub fn messages(&self) -> &ValidationLog {
        &self.messages
    }

    /// `true` when no `Error` message was emitted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.messages.has_errors()
    }

    #[must_use]
    pub fn into_parts(self) -> (T, ValidationLog) {
        (self.object, self.messages)
    }

    /// Converts the object, keeping the messages.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Built<U> {
        Built {
            object: f(self.object),
            messages: self.messages,
        }
    }
}

static MISSING: CellValue = CellValue::Missing;

/// A table under a display name used in message locators.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NamedTable<'a> {
    pub name: &'a str,
    pub table: &'a Table,
}

impl<'a> NamedTable<'a> {
    pub fn new(name: &'a str, table: &'a Table) -> Self {
        Self { name, table }
    }

    pub fn rows(&self) -> std::ops::Range<usize> {
        0..self.table.row_count()
    }

    /// Cell at `row` of `column`; absent columns read as missing.
    pub fn cell(&self, column: &str, row: usize) -> &'a CellValue {
        self.table
            .column(column)
            .and_then(|c| c.get(row))
            .unwrap_or(&MISSING)
    }

    pub fn locate(&self, row: usize) -> Locator {
        Locator::table(self.name).with_row(row)
    }

    /// Reads a finite number, or explains why the cell is not one.
    pub fn number(&self, column: &str, row: usize) -> Result<f64, String> {
        match self.cell(column, row) {
            CellValue::Missing => Err(format!("missing value in column '{column}'")),
            cell => cell
                .as_f64()
                .ok_or_else(|| format!("non-numeric value '{cell}' in column '{column}'")),
        }
    }

    /// Reads an x/y/z triple, reporting the first bad coordinate.
    pub fn point(&self, columns: [&str; 3], row: usize) -> Result<Point3, String> {
        let [x, y, z] = columns;
        Ok(Point3::new(
            self.number(x, row)?,
            self.number(y, row)?,
            self.number(z, row)?,
        ))
    }

    /// Reads a hole identifier as written in the source, so `0012` and `12`
    /// are distinct holes. Blank cells have none.
    pub fn hole_id(&self, column: &str, row: usize) -> Option<String> {
        self.table
            .column(column)
            .and_then(|c| c.raw(row))
            .map(str::to_string)
    }
}

/// Collects mapped columns that are absent from their tables.
#[derive(Debug, Default)]
pub(crate) struct ColumnCheck {
    missing: Vec<MissingColumn>,
    messages: ValidationLog,
}

impl ColumnCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, table: NamedTable<'_>, role: &str, column: &str) {
        if table.table.has_column(column) {
            return;
        }
        self.messages.error(
            format!("column '{column}' mapped to '{role}' does not exist"),
            Locator::table(table.name).with_column(column),
        );
        self.missing.push(MissingColumn {
            role: role.to_string(),
            column: Some(column.to_string()),
            table: Some(table.name.to_string()),
        });
    }

    /// The log to continue the build with, or the abort error.
    pub fn finish(self) -> Result<ValidationLog, MissingColumnError> {
        if self.missing.is_empty() {
            Ok(self.messages)
        } else {
            Err(MissingColumnError::new(self.missing, self.messages))
        }
    }
}

/// Resolves the attribute columns carried from `table`.
///
/// With no explicit selection every column not in `bound` is carried. A
/// listed column that does not exist is reported and skipped.
pub(crate) fn select_attributes(
    table: NamedTable<'_>,
    selection: &AttributeSelection,
    bound: &[&str],
    log: &mut ValidationLog,
) -> Vec<AttributeDef> {
    match selection {
        None => table
            .table
            .columns()
            .iter()
            .filter(|c| !bound.contains(&c.name()))
            .map(|c| AttributeDef {
                name: c.name().to_string(),
                data_type: c.data_type(),
            })
            .collect(),
        Some(names) => {
            let mut attributes: Vec<AttributeDef> = Vec::with_capacity(names.len());
            for name in names {
                if attributes.iter().any(|a| &a.name == name) {
                    continue;
                }
                match table.table.column(name) {
                    Some(column) => attributes.push(AttributeDef {
                        name: name.clone(),
                        data_type: column.data_type(),
                    }),
                    None => log.warning(
                        format!("attribute column '{name}' does not exist and was skipped"),
                        Locator::table(table.name).with_column(name.as_str()),
                    ),
                }
            }
            attributes
        },
    }
}

/// Attribute values of one row, aligned with `attributes`.
pub(crate) fn attribute_values(
    table: NamedTable<'_>,
    attributes: &[AttributeDef],
    row: usize,
) -> Vec<CellValue> {
    attributes
        .iter()
        .map(|a| table.cell(&a.name, row).clone())
        .collect()
}
