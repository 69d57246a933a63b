//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions for
//! presenting validation messages, the schema registry and table previews.

use tabled::builder::Builder;
use tabled::{Table, Tabled};

use geobuild_core::ValidationLog;
use geobuild_core::operations::TablePreview;
use geobuild_core::schemas::ObjectSchema;

/// Table row representation for one validation message.
#[derive(Tabled)]
pub struct MessageRow {
    #[tabled(rename = "Severity")]
    pub severity: String,
    /// Table, row, column and hole the message refers to.
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Message")]
    pub message: String,
}

/// Table row representation for displaying schema registry entries.
#[derive(Tabled)]
pub struct SchemaRow {
    /// Short identifier used with `build --type`.
    #[tabled(rename = "Type")]
    pub short_name: String,
    #[tabled(rename = "Name")]
    pub long_name: String,
    #[tabled(rename = "Schema")]
    pub schema: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Table row representation for one previewed column.
#[derive(Tabled)]
pub struct ColumnRow {
    #[tabled(rename = "Column")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub data_type: String,
    /// Number of blank cells.
    #[tabled(rename = "Missing")]
    pub missing: usize,
}

#[must_use]
pub fn messages_table(messages: &ValidationLog) -> String {
    let rows: Vec<MessageRow> = messages
        .messages()
        .iter()
        .map(|m| MessageRow {
            severity: m.severity.to_string(),
            location: if m.locator.is_empty() {
                "-".to_string()
            } else {
                m.locator.to_string()
            },
            message: m.message.clone(),
        })
        .collect();
    Table::new(rows).to_string()
}

/// Print the messages of a build, or a note that there were none.
pub fn display_messages(messages: &ValidationLog) {
    if messages.is_empty() {
        println!("\nNo validation messages.");
        return;
    }
    println!("\n=== Validation Messages ({}) ===", messages.len());
    println!("{}", messages_table(messages));
}

#[must_use]
pub fn schemas_table(schemas: &[ObjectSchema]) -> String {
    let rows: Vec<SchemaRow> = schemas
        .iter()
        .map(|s| SchemaRow {
            short_name: s.short_name.to_string(),
            long_name: s.long_name.to_string(),
            schema: s.schema_id.unwrap_or("N/A").to_string(),
            status: s.status.as_str().to_string(),
        })
        .collect();
    Table::new(rows).to_string()
}

/// Display a table preview: summary line, column table and first rows.
pub fn display_preview(preview: &TablePreview) {
    println!("\nSource: {}", preview.source);
    println!("Rows: {}", preview.row_count);
    println!("Columns: {}", preview.column_count);

    if !preview.columns.is_empty() {
        println!("\n=== Columns ===");
        let rows: Vec<ColumnRow> = preview
            .columns
            .iter()
            .map(|c| ColumnRow {
                name: c.name.clone(),
                data_type: c.data_type.to_string(),
                missing: c.missing,
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    if !preview.rows.is_empty() {
        println!("\n=== First {} Rows ===", preview.rows.len());
        println!("{}", rows_table(preview));
    }
}

fn rows_table(preview: &TablePreview) -> String {
    let mut builder = Builder::default();
    builder.push_record(preview.columns.iter().map(|c| c.name.clone()));
    for row in &preview.rows {
        builder.push_record(row.iter().map(|value| match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }));
    }
    builder.build().to_string()
}
