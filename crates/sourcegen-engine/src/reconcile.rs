//! Three-way merge of a warehouse snapshot, a prior source document and the
//! user's prune flags
//!
//! Ordering rule at every level: entries follow the warehouse order, and
//! document-only entries that are kept are appended in their original order.
//! Descriptions written in the document always win over warehouse ones;
//! `meta`, `tests`, identifiers and unknown keys are carried over verbatim.

use crate::selection::select_source;
use sourcegen_core::{ColumnDescriptor, TableDescriptor};
use sourcegen_dbt::{Column, Source, SourceDocument, Table, DEFAULT_VERSION};
use std::collections::{HashMap, HashSet};

/// Which document-only entries to drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOptions {
    /// Drop tables the warehouse no longer has
    pub prune_absent_tables: bool,

    /// Drop columns the warehouse no longer has
    pub prune_absent_columns: bool,
}

impl MergeOptions {
    /// Map CLI flags to merge options
    ///
    /// Columns are only pruned when column sync was requested as well.
    pub fn from_flags(sync_columns: bool, prune_absent: bool) -> Self {
        Self {
            prune_absent_tables: prune_absent,
            prune_absent_columns: prune_absent && sync_columns,
        }
    }
}

/// The source being reconciled and where it lives in the warehouse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTarget {
    /// Name of the dbt source to create or update
    pub source_name: String,

    /// Warehouse project, used as `database` when the source has none
    pub project_id: String,

    /// Warehouse dataset, used as `schema` when the source has none
    pub dataset_id: String,

    pub options: MergeOptions,
}

impl MergeTarget {
    pub fn new(
        source_name: impl Into<String>,
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            options: MergeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }
}

/// Merge warehouse columns into the columns a table already documents
pub fn merge_columns(
    remote: &[ColumnDescriptor],
    existing: &[Column],
    prune_absent: bool,
) -> Vec<Column> {
    // Later duplicates overwrite earlier ones
    let existing_by_name: HashMap<&str, &Column> =
        existing.iter().map(|c| (c.name.as_str(), c)).collect();
    let remote_names: HashSet<&str> = remote.iter().map(|c| c.name.as_str()).collect();

    let mut merged: Vec<Column> = remote
        .iter()
        .map(|descriptor| match existing_by_name.get(descriptor.name.as_str()) {
            Some(column) => merge_column(descriptor, column),
            None => Column::from_descriptor(descriptor),
        })
        .collect();

    if !prune_absent {
        merged.extend(
            existing
                .iter()
                .filter(|c| !remote_names.contains(c.name.as_str()))
                .cloned(),
        );
    }

    merged
}

fn merge_column(descriptor: &ColumnDescriptor, existing: &Column) -> Column {
    Column {
        name: descriptor.name.clone(),
        // The warehouse is authoritative for types
        data_type: Some(descriptor.data_type.clone()),
        description: prefer_existing(&existing.description, descriptor.description.as_deref()),
        meta: existing.meta.clone(),
        tests: existing.tests.clone(),
        extra: existing.extra.clone(),
    }
}

/// Merge one warehouse table with its document entry, if there is one
pub fn merge_table(
    remote: &TableDescriptor,
    existing: Option<&Table>,
    prune_absent_columns: bool,
) -> Table {
    let Some(existing) = existing else {
        return Table::from_descriptor(remote);
    };

    Table {
        name: existing.name.clone(),
        identifier: existing.identifier.clone(),
        description: prefer_existing(&existing.description, remote.description.as_deref()),
        meta: existing.meta.clone(),
        tests: existing.tests.clone(),
        extra: existing.extra.clone(),
        columns: merge_columns(&remote.columns, &existing.columns, prune_absent_columns),
    }
}

/// Merge the warehouse tables of a dataset into a source
///
/// Document tables are matched on `name == table_id`. A table whose
/// `identifier` points at a warehouse table under a different `name` is not
/// matched through the identifier.
pub fn merge_source(
    remote_tables: &[TableDescriptor],
    existing: Option<&Source>,
    target: &MergeTarget,
) -> Source {
    let empty;
    let source = match existing {
        Some(source) => source,
        None => {
            empty = Source::new(target.source_name.clone())
                .with_database(target.project_id.clone())
                .with_schema(target.dataset_id.clone());
            &empty
        }
    };

    let remote_ids: HashSet<&str> = remote_tables.iter().map(|t| t.table_id.as_str()).collect();
    let existing_by_name: HashMap<&str, &Table> =
        source.tables.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut tables: Vec<Table> = remote_tables
        .iter()
        .map(|remote| {
            let existing = existing_by_name.get(remote.table_id.as_str()).copied();
            merge_table(remote, existing, target.options.prune_absent_columns)
        })
        .collect();

    if !target.options.prune_absent_tables {
        tables.extend(
            source
                .tables
                .iter()
                .filter(|t| !remote_ids.contains(t.name.as_str()))
                .cloned(),
        );
    }

    Source {
        name: source.name.clone(),
        database: source.database.clone().or_else(|| Some(target.project_id.clone())),
        schema_name: source.schema_name.clone().or_else(|| Some(target.dataset_id.clone())),
        description: source.description.clone(),
        meta: source.meta.clone(),
        extra: source.extra.clone(),
        tables,
    }
}

/// Merge a snapshot into a whole source document
///
/// Sources other than the target come first, unchanged and in their original
/// order; the merged target source is always last.
pub fn merge_document(
    remote_tables: &[TableDescriptor],
    existing: Option<&SourceDocument>,
    target: &MergeTarget,
) -> SourceDocument {
    let existing_sources = existing.map(|d| d.sources.as_slice()).unwrap_or_default();
    let selection = select_source(existing_sources, &target.source_name, &target.dataset_id);

    let merged = merge_source(remote_tables, selection.selected, target);

    let mut sources: Vec<Source> = selection.others.into_iter().cloned().collect();
    sources.push(merged);

    SourceDocument {
        version: existing.map(|d| d.version).unwrap_or(DEFAULT_VERSION),
        sources,
    }
}

/// Keep a non-empty document description, else fall back to the warehouse's
fn prefer_existing(existing: &str, remote: Option<&str>) -> String {
    if existing.is_empty() {
        remote.unwrap_or_default().to_string()
    } else {
        existing.to_string()
    }
}
