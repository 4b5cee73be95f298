//! Store Module
//!
//! The remote store collaborator, consumed through the [`LogStore`] trait.
//!
//! ## Responsibilities
//! - Header queries (log headers, per-curve ranges, wellbore object lists)
//! - Data queries over an index range, bounded by negotiated capabilities
//! - Writes: add/delete logs, merge rows by index, delete index ranges
//!
//! ## Shape of a Call
//! ```text
//!   algorithm ──DataQuery──▶ LogStore ──CurveBatch──▶ protocol::decode_batch
//!   algorithm ──CurveBatch─▶ LogStore (update_log_data, merged by index)
//! ```
//!
//! Every call reports failure through [`CurveError`](crate::CurveError);
//! communication-layer failures are `Timeout` / `Communication` and are the
//! only ones [`with_retry`](crate::batch::with_retry) retries.

mod header;
mod memory;
mod query;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::CurveBatch;

pub use header::{
    LogCurveInfo, LogHeader, LogRef, MnemonicRange, ObjectSummary, StoreCapabilities,
    WellboreRef,
};
pub use memory::{Fault, InMemoryStore, StoreOp};
pub use query::{DataQuery, DeleteRange};

/// Request/response access to a log store
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Fetch a log header without data
    async fn get_log_header(&self, log: &LogRef) -> Result<LogHeader>;

    /// Fetch curve data
    ///
    /// Rows where none of the requested curves has a value are omitted.
    async fn get_log_data(&self, query: &DataQuery) -> Result<CurveBatch>;

    /// Create a log from a header (data ranges in the header are ignored)
    async fn add_log(&self, header: &LogHeader) -> Result<()>;

    /// Merge rows into a log by index, adding curves that do not exist yet
    async fn update_log_data(&self, log: &LogRef, data: &CurveBatch) -> Result<()>;

    /// Delete values in an index range
    async fn delete_log_data(&self, log: &LogRef, range: &DeleteRange) -> Result<()>;

    /// Delete a log and all its data
    async fn delete_log(&self, log: &LogRef) -> Result<()>;

    /// Limits and settings advertised by the store
    async fn capabilities(&self) -> Result<StoreCapabilities>;

    /// Every object stored under a wellbore
    async fn list_wellbore_objects(&self, wellbore: &WellboreRef) -> Result<Vec<ObjectSummary>>;
}
