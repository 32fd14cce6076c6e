//! Warehouse snapshot providers
//!
//! A provider lists the tables of one dataset with their columns, types and
//! descriptions, using the warehouse's INFORMATION_SCHEMA views.
//!
//! ## Features
//!
//! - `bigquery` - Google BigQuery support
//!
//! ## Example
//!
//! ```rust,ignore
//! use sourcegen_catalog::{BigQueryAdapter, SnapshotProvider};
//! use sourcegen_core::{DatasetRef, TableFilter};
//!
//! let adapter = BigQueryAdapter::with_adc("my-project").await?;
//! let dataset = DatasetRef::new("my-project", "raw");
//! let snapshot = adapter.fetch_dataset(&dataset, &TableFilter::all()).await?;
//! ```

pub mod adapter;
pub mod bigquery;
pub mod mock;

pub use adapter::{FetchError, SnapshotProvider};
pub use bigquery::BigQueryAdapter;
pub use mock::{MockAdapter, MockAdapterBuilder};
