//! In-memory snapshot provider for tests
//!
//! Holds datasets as lists of table descriptors and serves them without any
//! warehouse connection. Errors, latency and connection failures can be
//! injected to exercise the failure paths of a run.
//!
//! ```rust,ignore
//! use sourcegen_catalog::{MockAdapter, SnapshotProvider};
//! use sourcegen_core::{ColumnDescriptor, DatasetRef, TableDescriptor, TableFilter};
//!
//! let adapter = MockAdapter::new();
//! let dataset = DatasetRef::new("proj", "raw");
//! let users = TableDescriptor::new("users").with_column(ColumnDescriptor::new("id", "INT64"));
//! adapter.add_table(&dataset, users).await;
//!
//! let snapshot = adapter.fetch_dataset(&dataset, &TableFilter::all()).await?;
//! ```

use crate::adapter::{FetchError, SnapshotProvider};
use sourcegen_core::{DatasetRef, DatasetSnapshot, TableDescriptor, TableFilter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock snapshot provider
///
/// Clones share the same datasets and errors.
#[derive(Clone)]
pub struct MockAdapter {
    /// Tables by dataset FQN, in the order they were added
    datasets: Arc<RwLock<HashMap<String, Vec<TableDescriptor>>>>,

    /// Errors to return for specific datasets
    errors: Arc<RwLock<HashMap<String, FetchError>>>,

    fail_connection: bool,

    /// Simulated query latency (milliseconds)
    latency_ms: u64,

    adapter_name: &'static str,
}

impl MockAdapter {
    /// Create a mock adapter that knows no datasets
    pub fn new() -> Self {
        MockAdapterBuilder::new().build()
    }

    /// Register an empty dataset (replacing any tables it had)
    pub async fn add_dataset(&self, dataset: &DatasetRef) {
        self.datasets.write().await.insert(dataset.fqn(), Vec::new());
    }

    /// Add a table to a dataset, creating the dataset if needed
    ///
    /// A table with the same id replaces the earlier one in place.
    pub async fn add_table(&self, dataset: &DatasetRef, table: TableDescriptor) {
        let mut datasets = self.datasets.write().await;
        let tables = datasets.entry(dataset.fqn()).or_default();
        match tables.iter_mut().find(|t| t.table_id == table.table_id) {
            Some(existing) => *existing = table,
            None => tables.push(table),
        }
    }

    /// Remove a table from a dataset, returning whether it existed
    pub async fn remove_table(&self, dataset: &DatasetRef, table_id: &str) -> bool {
        let mut datasets = self.datasets.write().await;
        let Some(tables) = datasets.get_mut(&dataset.fqn()) else {
            return false;
        };
        let before = tables.len();
        tables.retain(|t| t.table_id != table_id);
        tables.len() != before
    }

    /// Configure an error to be returned for a dataset
    pub async fn add_error_for_dataset(&self, dataset: &DatasetRef, error: FetchError) {
        self.errors.write().await.insert(dataset.fqn(), error);
    }

    /// Clear all stored errors
    pub async fn clear_errors(&self) {
        self.errors.write().await.clear();
    }

    /// Make every `test_connection()` call fail
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Delay every call by `latency_ms` milliseconds
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set a custom adapter name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    /// Number of tables currently held for a dataset
    pub async fn table_count(&self, dataset: &DatasetRef) -> usize {
        self.datasets
            .read()
            .await
            .get(&dataset.fqn())
            .map_or(0, Vec::len)
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SnapshotProvider for MockAdapter {
    fn name(&self) -> &'static str {
        self.adapter_name
    }

    async fn fetch_dataset(
        &self,
        dataset: &DatasetRef,
        filter: &TableFilter,
    ) -> Result<DatasetSnapshot, FetchError> {
        self.simulate_latency().await;

        // Configured errors take precedence
        if let Some(error) = self.errors.read().await.get(&dataset.fqn()) {
            return Err(error.clone());
        }

        let datasets = self.datasets.read().await;
        let tables = datasets
            .get(&dataset.fqn())
            .ok_or_else(|| FetchError::DatasetNotFound(dataset.fqn()))?;

        let mut tables: Vec<TableDescriptor> = tables
            .iter()
            .filter(|t| filter.matches(&t.table_id))
            .cloned()
            .collect();
        // Same order a warehouse query returns
        tables.sort_by(|a, b| a.table_id.cmp(&b.table_id));

        tracing::debug!(dataset = %dataset, tables = tables.len(), "Served mock snapshot");
        Ok(DatasetSnapshot::new(dataset, tables))
    }

    async fn test_connection(&self) -> Result<(), FetchError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(FetchError::NetworkError("Simulated connection failure".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Builder for a [`MockAdapter`] with predefined datasets
///
/// ```rust,ignore
/// let adapter = MockAdapterBuilder::new()
///     .with_table("proj", "raw", TableDescriptor::new("users"))
///     .with_table("proj", "raw", TableDescriptor::new("orders"))
///     .with_latency(50)
///     .build();
/// ```
pub struct MockAdapterBuilder {
    datasets: HashMap<String, Vec<TableDescriptor>>,
    errors: HashMap<String, FetchError>,
    fail_connection: bool,
    latency_ms: u64,
    adapter_name: &'static str,
}

impl MockAdapterBuilder {
    pub fn new() -> Self {
        Self {
            datasets: HashMap::new(),
            errors: HashMap::new(),
            fail_connection: false,
            latency_ms: 0,
            adapter_name: "Mock",
        }
    }

    /// Register an empty dataset
    pub fn with_dataset(mut self, project_id: &str, dataset_id: &str) -> Self {
        self.datasets
            .entry(DatasetRef::new(project_id, dataset_id).fqn())
            .or_default();
        self
    }

    /// Add a table to a dataset
    pub fn with_table(
        mut self,
        project_id: &str,
        dataset_id: &str,
        table: TableDescriptor,
    ) -> Self {
        self.datasets
            .entry(DatasetRef::new(project_id, dataset_id).fqn())
            .or_default()
            .push(table);
        self
    }

    /// Add an error for a dataset
    pub fn with_error(mut self, project_id: &str, dataset_id: &str, error: FetchError) -> Self {
        self.errors.insert(DatasetRef::new(project_id, dataset_id).fqn(), error);
        self
    }

    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.adapter_name = name;
        self
    }

    pub fn build(self) -> MockAdapter {
        MockAdapter {
            datasets: Arc::new(RwLock::new(self.datasets)),
            errors: Arc::new(RwLock::new(self.errors)),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            adapter_name: self.adapter_name,
        }
    }
}

impl Default for MockAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
