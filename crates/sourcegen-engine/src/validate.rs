//! Duplicate-name checks run before a merge
//!
//! The merge indexes entries by name, so duplicates would silently collapse.
//! These checks turn that into an explicit error instead.

use sourcegen_core::TableDescriptor;
use sourcegen_dbt::SourceDocument;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuplicateEntityError {
    #[error("Duplicate table '{table}' in source '{source_name}'")]
    Table { source_name: String, table: String },

    #[error("Duplicate column '{column}' in table '{source_name}.{table}'")]
    Column {
        source_name: String,
        table: String,
        column: String,
    },

    #[error("Duplicate table '{0}' in warehouse snapshot")]
    SnapshotTable(String),

    #[error("Duplicate column '{column}' in warehouse table '{table}'")]
    SnapshotColumn { table: String, column: String },
}

/// Reject duplicate table names within a source and duplicate column names
/// within a table
pub fn validate_document(document: &SourceDocument) -> Result<(), DuplicateEntityError> {
    for source in &document.sources {
        let mut tables = HashSet::new();
        for table in &source.tables {
            if !tables.insert(table.name.as_str()) {
                return Err(DuplicateEntityError::Table {
                    source_name: source.name.clone(),
                    table: table.name.clone(),
                });
            }

            let mut columns = HashSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(DuplicateEntityError::Column {
                        source_name: source.name.clone(),
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Reject duplicate table ids and duplicate column names in a snapshot
pub fn validate_snapshot(tables: &[TableDescriptor]) -> Result<(), DuplicateEntityError> {
    let mut ids = HashSet::new();
    for table in tables {
        if !ids.insert(table.table_id.as_str()) {
            return Err(DuplicateEntityError::SnapshotTable(table.table_id.clone()));
        }

        let mut columns = HashSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(DuplicateEntityError::SnapshotColumn {
                    table: table.table_id.clone(),
                    column: column.name.clone(),
                });
            }
        }
    }
    Ok(())
}
