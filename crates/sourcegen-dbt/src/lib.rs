//! dbt source documents
//!
//! This crate handles:
//! - The source YAML entity model (`SourceDocument` → `Source` → `Table` → `Column`)
//! - Building fresh entities from a warehouse snapshot
//! - Loading and writing source YAML with explicit formatting options

pub mod document;
mod emit;
pub mod store;

pub use document::{Column, Meta, Source, SourceDocument, Table, Tests, DEFAULT_VERSION};
pub use store::{DocumentError, YamlStore};
