//! Persistence layer for Appraisal.
//!
//! Three tables record every batch run: `raw_data` (validated input),
//! `transformed_data` (model features) and `predictions` (one row per
//! transformed row). All of them carry the `batch_id` of the run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use appraisal_db::{BatchRecords, BatchWriter, Store};
//!
//! let writer = BatchWriter::new(Store::open("housing.sqlite3")?);
//! let persisted = writer
//!     .persist_batch(BatchRecords { raw: &raw, transformed: &features, predictions: &prices }, batch_id)
//!     .await?;
//! ```

mod connection;
mod error;
pub mod schema;
mod writer;

pub use connection::{ScopedConnection, Store, StoreConfig};
pub use error::{DbError, Result};
pub use schema::{
    initialize_database, ColumnDef, ColumnType, TableSchema, PREDICTIONS_TABLE, RAW_TABLE,
    TRANSFORMED_TABLE,
};
pub use writer::{
    BatchRecords, BatchWriter, PersistedBatch, WriteOptions, WriteSummary, WriteTarget,
};
