//! sourcegen core
//!
//! Warehouse-side snapshot types, table name filtering and the
//! `sourcegen.toml` configuration shared by every other crate.

pub mod config;
pub mod filter;
pub mod snapshot;

pub use config::{Config, ConfigError, FormatConfig, QuoteStyle, WarehouseConfig};
pub use filter::TableFilter;
pub use snapshot::{ColumnDescriptor, DatasetRef, DatasetSnapshot, TableDescriptor};
