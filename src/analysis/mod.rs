//! Analysis Module
//!
//! Index-range algorithms that read a log and report on it without writing.
//!
//! ## Responsibilities
//! - Gap detection per curve against a size threshold
//! - Minimum-data QC (presence, data, first large gap, density)
//! - Header/data boundary consistency
//!
//! ## Data Flow
//! ```text
//!   LogStore ──header──▶ ranges, start/end
//!       │
//!       └──BatchReader──▶ CurveRowSet ──scan──▶ Report
//! ```
//! Gap and QC drain the whole selected range into memory before scanning.

mod consistency;
mod gap;
mod quality;

pub use consistency::{check_header, same_boundary, ConsistencyRequest};
pub use gap::{analyze_gaps, find_gaps, GapRequest};
pub use quality::{check_curve, minimum_data_qc, QcRequest};
