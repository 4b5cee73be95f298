//! Compare Module
//!
//! Cross-source algorithms: the same log or wellbore read from two stores
//! (or twice from one) and diffed into a bounded report.
//!
//! ## Bounded Output
//! ```text
//!   curve tasks ──▶ Vec<item> each (≤ cap + 1)
//!                         │
//!                         ▼
//!   coordinator fold ──▶ report (≤ cap) + warning when truncated
//! ```

mod log_data;
mod wellbore;

pub use log_data::{compare_log_data, diff_curve, values_equal, CompareRequest};
pub use wellbore::{compare_wellbores, diff_objects, WellboreCompareRequest};
