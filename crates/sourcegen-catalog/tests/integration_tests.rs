//! Integration tests for snapshot providers
//!
//! Mock tests need no credentials. Tests against a real warehouse are marked
//! `#[ignore]` and can be run with `cargo test -- --ignored`.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all non-ignored tests (no credentials required)
//! cargo test -p sourcegen-catalog --test integration_tests
//!
//! # Run BigQuery integration tests
//! GOOGLE_APPLICATION_CREDENTIALS=/path/to/key.json \
//! SOURCEGEN_BIGQUERY_PROJECT=my-project \
//! SOURCEGEN_BIGQUERY_DATASET=my_dataset \
//! cargo test -p sourcegen-catalog --features bigquery --test integration_tests -- --ignored
//! ```

mod fixtures;

use pretty_assertions::assert_eq;
use sourcegen_catalog::{FetchError, MockAdapter, MockAdapterBuilder, SnapshotProvider};
use sourcegen_core::{DatasetRef, TableFilter};

fn has_bigquery_credentials() -> bool {
    std::env::var("GOOGLE_APPLICATION_CREDENTIALS").is_ok()
        || std::env::var("SOURCEGEN_BIGQUERY_PROJECT").is_ok()
}

async fn loaded_adapter(dataset: &DatasetRef) -> MockAdapter {
    let adapter = MockAdapter::new();
    for table in fixtures::all_tables() {
        adapter.add_table(dataset, table).await;
    }
    adapter
}

// =============================================================================
// Mock Adapter Tests (No credentials required)
// =============================================================================

#[tokio::test]
async fn test_mock_snapshot_workflow() {
    let dataset = DatasetRef::new("proj", "raw");
    let adapter = loaded_adapter(&dataset).await;

    let snapshot = adapter.fetch_dataset(&dataset, &TableFilter::all()).await.unwrap();

    assert_eq!(
        snapshot.table_ids(),
        vec!["orders", "stg_events", "stg_events_backup", "users"]
    );

    let users = snapshot.find_table("users").unwrap();
    assert_eq!(users.description.as_deref(), Some("Application users"));
    assert_eq!(users.column_names(), vec!["id", "email", "created_at", "is_active"]);
    assert_eq!(
        users.find_column("id").and_then(|c| c.description.as_deref()),
        Some("Surrogate key")
    );
}

#[tokio::test]
async fn test_mock_types_kept_verbatim() {
    let dataset = DatasetRef::new("proj", "raw");
    let adapter = loaded_adapter(&dataset).await;

    let snapshot = adapter.fetch_dataset(&dataset, &TableFilter::all()).await.unwrap();
    let events = snapshot.find_table("stg_events").unwrap();

    let types: Vec<&str> = events.columns.iter().map(|c| c.data_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["STRING", "ARRAY<STRING>", "STRUCT<source STRING, attempts INT64>", "GEOGRAPHY"]
    );
}

#[tokio::test]
async fn test_mock_pattern_and_exclude() {
    let dataset = DatasetRef::new("proj", "raw");
    let adapter = loaded_adapter(&dataset).await;

    let filter = TableFilter::new(Some("stg_*"), None).unwrap();
    let snapshot = adapter.fetch_dataset(&dataset, &filter).await.unwrap();
    assert_eq!(snapshot.table_ids(), vec!["stg_events", "stg_events_backup"]);

    let filter = TableFilter::new(Some("stg_*"), Some("backup")).unwrap();
    let snapshot = adapter.fetch_dataset(&dataset, &filter).await.unwrap();
    assert_eq!(snapshot.table_ids(), vec!["stg_events"]);

    let filter = TableFilter::new(Some("nothing_*"), None).unwrap();
    let snapshot = adapter.fetch_dataset(&dataset, &filter).await.unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_mock_datasets_are_isolated() {
    let adapter = MockAdapterBuilder::new()
        .with_table("proj", "raw", fixtures::users_table())
        .with_table("proj", "staging", fixtures::orders_table())
        .with_dataset("other", "empty")
        .build();

    let raw = adapter
        .fetch_dataset(&DatasetRef::new("proj", "raw"), &TableFilter::all())
        .await
        .unwrap();
    assert_eq!(raw.table_ids(), vec!["users"]);

    let empty = adapter
        .fetch_dataset(&DatasetRef::new("other", "empty"), &TableFilter::all())
        .await
        .unwrap();
    assert!(empty.is_empty());

    let missing = adapter
        .fetch_dataset(&DatasetRef::new("other", "raw"), &TableFilter::all())
        .await;
    assert!(matches!(missing, Err(FetchError::DatasetNotFound(ref fqn)) if fqn == "other.raw"));
}

#[tokio::test]
async fn test_mock_configured_errors() {
    let adapter = MockAdapterBuilder::new()
        .with_table("proj", "raw", fixtures::users_table())
        .with_error("proj", "raw", FetchError::AuthenticationError("expired token".to_string()))
        .build();

    let result = adapter
        .fetch_dataset(&DatasetRef::new("proj", "raw"), &TableFilter::all())
        .await;
    assert_eq!(result, Err(FetchError::AuthenticationError("expired token".to_string())));
}

#[tokio::test]
async fn test_mock_latency_simulation() {
    let dataset = DatasetRef::new("proj", "raw");
    let adapter = MockAdapter::new().with_latency(100);
    adapter.add_dataset(&dataset).await;

    let start = std::time::Instant::now();
    let _ = adapter.fetch_dataset(&dataset, &TableFilter::all()).await;

    assert!(start.elapsed().as_millis() >= 100);
}

#[tokio::test]
async fn test_mock_connection_failure() {
    let adapter = MockAdapterBuilder::new().with_connection_failure().build();
    assert!(matches!(adapter.test_connection().await, Err(FetchError::NetworkError(_))));
}

#[tokio::test]
async fn test_providers_as_trait_objects() {
    let dataset = DatasetRef::new("proj", "raw");
    let provider: Box<dyn SnapshotProvider> = Box::new(loaded_adapter(&dataset).await);

    assert_eq!(provider.name(), "Mock");
    let snapshot = provider.fetch_dataset(&dataset, &TableFilter::all()).await.unwrap();
    assert_eq!(snapshot.tables.len(), 4);
}

// =============================================================================
// BigQuery Integration Tests (require credentials)
// =============================================================================

#[tokio::test]
#[ignore] // Run with: cargo test --features bigquery -- --ignored
async fn test_bigquery_connection() {
    if !has_bigquery_credentials() {
        eprintln!("Skipping BigQuery test: no credentials available");
        eprintln!("Set GOOGLE_APPLICATION_CREDENTIALS or SOURCEGEN_BIGQUERY_PROJECT");
        return;
    }

    #[cfg(feature = "bigquery")]
    {
        use sourcegen_catalog::BigQueryAdapter;

        let project_id = std::env::var("SOURCEGEN_BIGQUERY_PROJECT")
            .or_else(|_| std::env::var("GCP_PROJECT"))
            .expect("SOURCEGEN_BIGQUERY_PROJECT or GCP_PROJECT must be set");

        let adapter = BigQueryAdapter::with_adc(&project_id)
            .await
            .expect("Failed to create BigQuery adapter");

        adapter.test_connection().await.expect("Connection test failed");
    }

    #[cfg(not(feature = "bigquery"))]
    {
        eprintln!("BigQuery feature not enabled. Rebuild with --features bigquery");
    }
}

#[tokio::test]
#[ignore]
async fn test_bigquery_fetch_dataset() {
    if !has_bigquery_credentials() {
        return;
    }

    #[cfg(feature = "bigquery")]
    {
        use sourcegen_catalog::BigQueryAdapter;

        let project_id = std::env::var("SOURCEGEN_BIGQUERY_PROJECT")
            .expect("SOURCEGEN_BIGQUERY_PROJECT must be set");
        let dataset_id = std::env::var("SOURCEGEN_BIGQUERY_DATASET")
            .expect("SOURCEGEN_BIGQUERY_DATASET must be set");

        let adapter = BigQueryAdapter::with_adc(&project_id)
            .await
            .expect("Failed to create adapter");

        let dataset = DatasetRef::new(&project_id, &dataset_id);
        let snapshot = adapter
            .fetch_dataset(&dataset, &TableFilter::all())
            .await
            .expect("Failed to fetch dataset");

        let mut ids = snapshot.table_ids();
        ids.sort();
        assert_eq!(ids, snapshot.table_ids());
        for table in &snapshot.tables {
            println!("{} ({} columns)", table.table_id, table.columns.len());
        }
    }
}

#[tokio::test]
async fn test_bigquery_without_feature_reports_config_error() {
    #[cfg(not(feature = "bigquery"))]
    {
        use sourcegen_catalog::BigQueryAdapter;

        let result = BigQueryAdapter::with_adc("my-project").await;
        assert!(matches!(
            result,
            Err(FetchError::ConfigError(ref msg)) if msg.contains("--features bigquery")
        ));
    }
}
