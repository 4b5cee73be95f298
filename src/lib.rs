//! # wellcurve
//!
//! Well-log curve reconciliation over a paginated log store:
//! - Depth and time indexes with direction-aware, epsilon-advancing arithmetic
//! - Paginated curve reads and chunked, retried writes
//! - Gap analysis, minimum-data QC and header/data consistency checks
//! - Log and wellbore comparison with bounded reports
//! - Splice, offset and trim transforms
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Engine (Job → JobOutcome)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!        ┌──────────────┼──────────────────┐
//!        ▼              ▼                  ▼
//!  ┌───────────┐  ┌───────────┐     ┌─────────────┐
//!  │ analysis  │  │  compare  │     │  transform  │
//!  │ gap/qc/   │  │ log data/ │     │ splice/     │
//!  │ consist.  │  │ wellbore  │     │ offset/trim │
//!  └─────┬─────┘  └─────┬─────┘     └──────┬──────┘
//!        └──────────────┼──────────────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │      batch      │  BatchReader / BatchWriter / with_retry
//!              └────────┬────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │ protocol + index│  wire rows, Index / Delta
//!              └────────┬────────┘
//!                       ▼
//!              ┌─────────────────┐
//!              │  store (trait)  │  LogStore, InMemoryStore
//!              └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod protocol;
pub mod store;
pub mod batch;
pub mod report;
pub mod job;
pub mod analysis;
pub mod compare;
pub mod transform;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CurveError, Result};
pub use config::Config;
pub use engine::{Engine, Job};
pub use index::{Delta, Direction, Index, IndexType};
pub use job::{JobContext, JobOutcome, OutcomeStatus};
pub use report::{Report, ReportItem};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of wellcurve
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
