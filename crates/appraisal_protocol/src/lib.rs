//! Shared record model for Appraisal.
//!
//! Every crate in the workspace speaks in [`RecordSet`]s: the loader produces
//! them, the transformer reshapes them, the model scores them and the writer
//! persists them under a [`BatchId`].

pub mod batch;
pub mod paths;
pub mod record_set;
pub mod types;

pub use batch::{BatchId, BatchIdGenerator};
pub use record_set::{Field, RecordSet, RecordSetError};
pub use types::{DataType, Value, SENTINEL_NULL};
