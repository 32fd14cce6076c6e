//! Snapshot provider trait for listing a dataset's tables

use sourcegen_core::{DatasetRef, DatasetSnapshot, TableFilter};

/// Errors that can occur when fetching a snapshot
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Source of warehouse snapshots
///
/// Implementations return the tables in warehouse order (by table name) and
/// each table's columns in ordinal order. An existing dataset without tables
/// is a valid, empty snapshot.
#[async_trait::async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Get the provider name (e.g., "BigQuery")
    fn name(&self) -> &'static str;

    /// List the tables of a dataset that pass `filter`
    async fn fetch_dataset(
        &self,
        dataset: &DatasetRef,
        filter: &TableFilter,
    ) -> Result<DatasetSnapshot, FetchError>;

    /// Check credentials and connectivity before fetching
    async fn test_connection(&self) -> Result<(), FetchError>;
}
