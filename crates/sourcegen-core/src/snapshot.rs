//! Remote schema snapshot types
//!
//! These describe what the warehouse reports right now. They are produced by a
//! catalog adapter and consumed read-only by the reconciliation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A column as reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name (unique within its table)
    pub name: String,

    /// Declared warehouse type, verbatim (e.g. `INT64`, `ARRAY<STRING>`)
    pub data_type: String,

    /// Description stored on the warehouse column, if any
    #[serde(default)]
    pub description: Option<String>,
}

impl ColumnDescriptor {
    /// Create a new column descriptor without a description
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            description: None,
        }
    }

    /// Set the remote description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A table as reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table id (unique within a snapshot)
    pub table_id: String,

    /// Description stored on the warehouse table, if any
    #[serde(default)]
    pub description: Option<String>,

    /// Columns in warehouse ordinal order
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Create a table descriptor with no columns
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            description: None,
            columns: Vec::new(),
        }
    }

    /// Set the remote description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a column
    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Identifies a dataset in a warehouse
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    /// Project (database) id
    pub project_id: String,

    /// Dataset (schema) id
    pub dataset_id: String,
}

impl DatasetRef {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}", self.project_id, self.dataset_id)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// Every table of one dataset, in the order the adapter returned them
///
/// A snapshot with no tables is valid: it means the filter matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub project_id: String,
    pub dataset_id: String,
    pub tables: Vec<TableDescriptor>,
}

impl DatasetSnapshot {
    /// Create a snapshot for a dataset
    pub fn new(dataset: &DatasetRef, tables: Vec<TableDescriptor>) -> Self {
        Self {
            project_id: dataset.project_id.clone(),
            dataset_id: dataset.dataset_id.clone(),
            tables,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Find a table by id
    pub fn find_table(&self, table_id: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.table_id == table_id)
    }

    /// Get table ids in snapshot order
    pub fn table_ids(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_id.as_str()).collect()
    }
}
