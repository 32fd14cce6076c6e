//! sourcegen engine - reconciliation of warehouse snapshots with source documents
//!
//! This crate implements the merge at the heart of sourcegen:
//! - Column, table, source and document reconciliation
//! - Target source selection
//! - Duplicate-name validation
//! - Change summaries between two versions of a source
//!
//! Everything here is a pure function of its inputs. Nothing touches the
//! filesystem or the network, and inputs are never mutated.

pub mod changes;
pub mod reconcile;
pub mod selection;
pub mod validate;

pub use changes::{ChangeSet, TableChange, TypeChange};
pub use reconcile::{
    merge_columns, merge_document, merge_source, merge_table, MergeOptions, MergeTarget,
};
pub use selection::{resolve_source_name, select_source, SourceSelection};
pub use validate::{validate_document, validate_snapshot, DuplicateEntityError};
