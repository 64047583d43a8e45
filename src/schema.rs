//! Schema description value type.
//!
//! An ordered table → columns mapping produced fresh per call from the
//! live catalog (see [`crate::db::fetch_schema`]); rendered as one
//! `TABLE: name (col type, ...)` line per table for prompt grounding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Ordered description of the live database schema. Order follows the
/// catalog query (table name, then ordinal position) and is preserved in
/// the rendered prompt text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableInfo>,
}

impl SchemaDescription {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Append a column, creating the table entry on first sight. Rows must
    /// arrive already ordered; this only groups adjacent runs.
    pub fn push_column(&mut self, table: &str, column: ColumnInfo) {
        match self.tables.last_mut() {
            Some(last) if last.name == table => last.columns.push(column),
            _ => self.tables.push(TableInfo {
                name: table.to_string(),
                columns: vec![column],
            }),
        }
    }

    /// Render for the LLM prompt: `TABLE: <name> (<col> <type>, ...)` per line.
    pub fn to_prompt_text(&self) -> String {
        self.tables
            .iter()
            .map(|t| {
                let cols: Vec<String> = t
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.data_type))
                    .collect();
                format!("TABLE: {} ({})", t.name, cols.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
