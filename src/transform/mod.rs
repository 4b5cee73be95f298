//! Transform Module
//!
//! Algorithms that read curve data, rewrite it and write it back.
//!
//! ## Responsibilities
//! - Splice: merge N logs into a new one, earlier logs winning inside their coverage
//! - Offset: shift selected curves by a constant delta, with optional backup/restore
//! - Trim: delete data outside a new start/end
//!
//! Every write and delete goes through [`with_retry`](crate::batch::with_retry).
//! Outcomes distinguish full success, partial success and failure.

mod offset;
mod splice;
mod trim;

pub use offset::{offset_curves, shift_rows, OffsetRequest};
pub use splice::{merge_curve_infos, splice_logs, SpliceAccumulator, SpliceRequest};
pub use trim::{plan_trim, trim_log, TrimPlan, TrimRequest};
