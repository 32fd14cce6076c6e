//! sourcegen command line support
//!
//! The binary is a thin layer over [`pipeline::reconcile`], which is exposed
//! here so runs can be driven against any snapshot provider.

pub mod pipeline;

pub use pipeline::{
    reconcile, ReconcileError, ReconcileOutcome, ReconcileRequest, ReconcileSummary,
};
