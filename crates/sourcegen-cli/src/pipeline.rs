//! One reconciliation run: fetch, load, merge, store
//!
//! Ties a snapshot provider and a YAML store to the engine. Every failure is
//! fatal for the run and nothing is written unless the merge succeeded.

use sourcegen_catalog::{FetchError, SnapshotProvider};
use sourcegen_core::{DatasetRef, TableFilter};
use sourcegen_dbt::{DocumentError, SourceDocument, YamlStore};
use sourcegen_engine::{
    merge_document, resolve_source_name, select_source, validate_document, validate_snapshot,
    ChangeSet, DuplicateEntityError, MergeOptions, MergeTarget,
};
use std::path::PathBuf;

/// Inputs of a run, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub project_id: String,
    pub dataset_id: String,

    /// Source YAML file to create or update
    pub output: PathBuf,

    /// Glob restricting which tables are listed (e.g. `stg_*`)
    pub table_pattern: Option<String>,

    /// Skip tables whose name contains this substring
    pub exclude: Option<String>,

    pub sync_columns: bool,

    /// Drop document tables (and, with `sync_columns`, columns) the warehouse no longer has
    pub prune_absent: bool,

    /// Explicit source name; otherwise resolved from the document or dataset
    pub source_name: Option<String>,

    /// Compute and render the result without writing it
    pub dry_run: bool,
}

impl ReconcileRequest {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            output: output.into(),
            table_pattern: None,
            exclude: None,
            sync_columns: false,
            prune_absent: false,
            source_name: None,
            dry_run: false,
        }
    }

    pub fn with_table_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.table_pattern = Some(pattern.into());
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = Some(exclude.into());
        self
    }

    pub fn with_sync_columns(mut self, sync_columns: bool) -> Self {
        self.sync_columns = sync_columns;
        self
    }

    pub fn with_prune_absent(mut self, prune_absent: bool) -> Self {
        self.prune_absent = prune_absent;
        self
    }

    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn dataset(&self) -> DatasetRef {
        DatasetRef::new(&self.project_id, &self.dataset_id)
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::from_flags(self.sync_columns, self.prune_absent)
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSummary {
    pub source_name: String,
    pub output: PathBuf,

    /// Number of warehouse tables that took part in the merge
    pub remote_tables: usize,

    pub changes: ChangeSet,

    /// Later sources that also matched the dataset and were left untouched
    pub ambiguous_sources: Vec<String>,

    /// Rendered YAML, only kept for dry runs
    pub rendered: Option<String>,
}

impl ReconcileSummary {
    pub fn written(&self) -> bool {
        self.rendered.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The output file did not exist before the run
    Created(ReconcileSummary),

    /// An existing output file was merged into
    Updated(ReconcileSummary),

    /// The warehouse returned no tables; nothing was written
    NothingToDo { dataset: DatasetRef },
}

impl ReconcileOutcome {
    pub fn summary(&self) -> Option<&ReconcileSummary> {
        match self {
            Self::Created(summary) | Self::Updated(summary) => Some(summary),
            Self::NothingToDo { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid table filter: {0}")]
    InvalidFilter(String),

    #[error("Warehouse snapshot unavailable: {0}")]
    SnapshotUnavailable(#[from] FetchError),

    #[error("Cannot use existing source file: {0}")]
    DocumentParse(DocumentError),

    #[error("Cannot write source file: {0}")]
    DocumentWrite(DocumentError),

    #[error(transparent)]
    DuplicateEntity(#[from] DuplicateEntityError),
}

/// Run one reconciliation against `provider`, reading and writing via `store`
pub async fn reconcile(
    provider: &dyn SnapshotProvider,
    store: &YamlStore,
    request: &ReconcileRequest,
) -> Result<ReconcileOutcome, ReconcileError> {
    let filter = TableFilter::new(request.table_pattern.as_deref(), request.exclude.as_deref())
        .map_err(|e| ReconcileError::InvalidFilter(e.to_string()))?;
    let dataset = request.dataset();

    tracing::info!(provider = provider.name(), dataset = %dataset, "Fetching dataset snapshot");
    let snapshot = provider.fetch_dataset(&dataset, &filter).await?;

    if snapshot.is_empty() {
        tracing::warn!("No tables found in dataset {}", dataset);
        return Ok(ReconcileOutcome::NothingToDo { dataset });
    }
    validate_snapshot(&snapshot.tables)?;

    let existing = store
        .load(&request.output)
        .map_err(ReconcileError::DocumentParse)?;
    if let Some(document) = &existing {
        validate_document(document)?;
    }

    let source_name = resolve_source_name(
        existing.as_ref(),
        &request.dataset_id,
        request.source_name.as_deref(),
    );

    let (merged, changes, ambiguous_sources) = match &existing {
        Some(document) => {
            tracing::info!("File exists, updating {}", request.output.display());

            let selection = select_source(&document.sources, &source_name, &request.dataset_id);
            if selection.is_ambiguous() {
                tracing::warn!(
                    selected = selection.selected.map(|s| s.name.as_str()).unwrap_or_default(),
                    "Sources {:?} also match dataset {} and are left unchanged",
                    selection.ambiguous,
                    request.dataset_id
                );
            }

            let target = MergeTarget::new(&source_name, &request.project_id, &request.dataset_id)
                .with_options(request.merge_options());
            let merged = merge_document(&snapshot.tables, Some(document), &target);

            // The merged source is always the last one
            let changes = merged
                .sources
                .last()
                .map(|after| ChangeSet::between(selection.selected, after))
                .unwrap_or_default();
            let ambiguous = selection.ambiguous.iter().map(|s| s.to_string()).collect();

            (merged, changes, ambiguous)
        }
        None => {
            tracing::info!("File doesn't exist, creating {}", request.output.display());

            let created = SourceDocument::from_snapshot(&snapshot, Some(&source_name));
            let changes = created
                .sources
                .first()
                .map(|after| ChangeSet::between(None, after))
                .unwrap_or_default();

            (created, changes, Vec::new())
        }
    };

    let rendered = if request.dry_run {
        Some(store.render(&merged).map_err(ReconcileError::DocumentWrite)?)
    } else {
        store
            .store(&request.output, &merged)
            .map_err(ReconcileError::DocumentWrite)?;
        None
    };

    let summary = ReconcileSummary {
        source_name,
        output: request.output.clone(),
        remote_tables: snapshot.tables.len(),
        changes,
        ambiguous_sources,
        rendered,
    };

    match existing {
        Some(_) => {
            if summary.written() {
                tracing::info!("Updated source file {}", request.output.display());
            }
            Ok(ReconcileOutcome::Updated(summary))
        }
        None => {
            if summary.written() {
                tracing::info!("Created source file at {}", request.output.display());
            }
            Ok(ReconcileOutcome::Created(summary))
        }
    }
}
