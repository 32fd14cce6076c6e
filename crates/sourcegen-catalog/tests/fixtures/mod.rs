//! Reusable warehouse tables for provider tests
//!
//! Shapes mirror what a raw landing dataset usually holds.

use sourcegen_core::{ColumnDescriptor, TableDescriptor};

/// A users table with a table description and one described column
pub fn users_table() -> TableDescriptor {
    TableDescriptor::new("users")
        .with_description("Application users")
        .with_column(ColumnDescriptor::new("id", "INT64").with_description("Surrogate key"))
        .with_column(ColumnDescriptor::new("email", "STRING"))
        .with_column(ColumnDescriptor::new("created_at", "TIMESTAMP"))
        .with_column(ColumnDescriptor::new("is_active", "BOOL"))
}

/// An orders table without descriptions
pub fn orders_table() -> TableDescriptor {
    TableDescriptor::new("orders")
        .with_column(ColumnDescriptor::new("id", "INT64"))
        .with_column(ColumnDescriptor::new("user_id", "INT64"))
        .with_column(ColumnDescriptor::new("total_amount", "NUMERIC(10, 2)"))
        .with_column(ColumnDescriptor::new("status", "STRING"))
}

/// A table using nested and parameterised BigQuery types
pub fn events_table() -> TableDescriptor {
    TableDescriptor::new("stg_events")
        .with_column(ColumnDescriptor::new("event_id", "STRING"))
        .with_column(ColumnDescriptor::new("tags", "ARRAY<STRING>"))
        .with_column(ColumnDescriptor::new(
            "payload",
            "STRUCT<source STRING, attempts INT64>",
        ))
        .with_column(ColumnDescriptor::new("location", "GEOGRAPHY"))
}

/// A scratch table that exclusion filters are expected to drop
pub fn events_backup_table() -> TableDescriptor {
    TableDescriptor::new("stg_events_backup")
        .with_column(ColumnDescriptor::new("event_id", "STRING"))
}

/// Every fixture table, in no particular order
pub fn all_tables() -> Vec<TableDescriptor> {
    vec![users_table(), events_backup_table(), orders_table(), events_table()]
}
