//! What a reconciliation changed in a source
//!
//! Compares the source before and after a merge, much like a drift check
//! between a contract and the warehouse, but on document entities.

use sourcegen_dbt::{Source, Table};
use std::collections::HashSet;

/// A column whose `data_type` changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChange {
    pub column: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Column-level changes of a table present before and after
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableChange {
    pub table: String,
    pub added_columns: Vec<String>,
    pub removed_columns: Vec<String>,
    pub type_changes: Vec<TypeChange>,
}

impl TableChange {
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.type_changes.is_empty()
    }
}

/// Summary of the differences between two versions of a source
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub added_tables: Vec<String>,
    pub removed_tables: Vec<String>,

    /// Only tables with at least one column change
    pub table_changes: Vec<TableChange>,
}

impl ChangeSet {
    /// Diff a source before and after a merge
    ///
    /// With no `before`, every table in `after` counts as added.
    pub fn between(before: Option<&Source>, after: &Source) -> Self {
        let empty: &[Table] = &[];
        let before_tables = before.map(|s| s.tables.as_slice()).unwrap_or(empty);

        let after_names: HashSet<&str> = after.tables.iter().map(|t| t.name.as_str()).collect();
        let mut changes = Self::default();

        for table in &after.tables {
            match before_tables.iter().find(|t| t.name == table.name) {
                Some(previous) => {
                    let change = diff_table(previous, table);
                    if !change.is_empty() {
                        changes.table_changes.push(change);
                    }
                }
                None => changes.added_tables.push(table.name.clone()),
            }
        }

        changes.removed_tables = before_tables
            .iter()
            .filter(|t| !after_names.contains(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect();

        changes
    }

    /// Check if nothing changed at table or column level
    pub fn is_empty(&self) -> bool {
        self.added_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.table_changes.is_empty()
    }

    /// Count added columns across all changed tables
    pub fn added_column_count(&self) -> usize {
        self.table_changes.iter().map(|c| c.added_columns.len()).sum()
    }

    /// Count removed columns across all changed tables
    pub fn removed_column_count(&self) -> usize {
        self.table_changes.iter().map(|c| c.removed_columns.len()).sum()
    }

    /// Count type changes across all changed tables
    pub fn type_change_count(&self) -> usize {
        self.table_changes.iter().map(|c| c.type_changes.len()).sum()
    }
}

fn diff_table(before: &Table, after: &Table) -> TableChange {
    let mut change = TableChange {
        table: after.name.clone(),
        ..TableChange::default()
    };

    for column in &after.columns {
        match before.find_column(&column.name) {
            Some(previous) if previous.data_type != column.data_type => {
                change.type_changes.push(TypeChange {
                    column: column.name.clone(),
                    before: previous.data_type.clone(),
                    after: column.data_type.clone(),
                });
            }
            Some(_) => {}
            None => change.added_columns.push(column.name.clone()),
        }
    }

    change.removed_columns = before
        .columns
        .iter()
        .filter(|c| after.find_column(&c.name).is_none())
        .map(|c| c.name.clone())
        .collect();

    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use sourcegen_dbt::Column;

    fn table(name: &str, columns: &[(&str, &str)]) -> Table {
        Table::new(name).with_columns(
            columns
                .iter()
                .map(|(n, t)| Column::new(*n).with_data_type(*t))
                .collect(),
        )
    }

    #[test]
    fn no_changes() {
        let source = Source::new("raw").with_tables(vec![table("t", &[("id", "INT64")])]);
        let changes = ChangeSet::between(Some(&source), &source);
        assert!(changes.is_empty());
    }

    #[test]
    fn everything_added_without_before() {
        let after = Source::new("raw").with_tables(vec![table("a", &[]), table("b", &[])]);
        let changes = ChangeSet::between(None, &after);
        assert_eq!(changes.added_tables, vec!["a", "b"]);
        assert!(changes.removed_tables.is_empty());
    }

    #[test]
    fn table_and_column_changes() {
        let before = Source::new("raw").with_tables(vec![
            table("users", &[("id", "STRING"), ("legacy", "BOOL")]),
            table("dropped", &[]),
        ]);
        let after = Source::new("raw").with_tables(vec![
            table("users", &[("id", "INT64"), ("email", "STRING")]),
            table("orders", &[("id", "INT64")]),
        ]);

        let changes = ChangeSet::between(Some(&before), &after);
        assert_eq!(changes.added_tables, vec!["orders"]);
        assert_eq!(changes.removed_tables, vec!["dropped"]);
        assert_eq!(changes.table_changes.len(), 1);

        let users = &changes.table_changes[0];
        assert_eq!(users.table, "users");
        assert_eq!(users.added_columns, vec!["email"]);
        assert_eq!(users.removed_columns, vec!["legacy"]);
        assert_eq!(
            users.type_changes,
            vec![TypeChange {
                column: "id".to_string(),
                before: Some("STRING".to_string()),
                after: Some("INT64".to_string()),
            }]
        );
        assert_eq!(changes.added_column_count(), 1);
        assert_eq!(changes.removed_column_count(), 1);
        assert_eq!(changes.type_change_count(), 1);
    }
}
