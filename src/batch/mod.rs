//! Batch Module
//!
//! Paginated reads from and chunked writes to a log store.
//!
//! ## Reading
//! ```text
//!   cursor = start
//!   loop:
//!     rows = fetch(cursor..=end, max_rows)     ── at most the negotiated rows
//!     if rows is empty: done
//!     yield rows
//!     cursor = step_past(last(rows))           ── never re-reads the last row
//! ```
//!
//! ## Writing
//! ```text
//!   for chunk in rows.chunks(max_rows):
//!     with_retry(update(chunk))               ── one retry after a fixed delay
//! ```
//!
//! Reads never retry: transport failures reach the caller unchanged. Writes
//! absorb a single transient fault.

mod reader;
mod retry;
mod writer;

pub use reader::{read_range, BatchReader, ReadRequest};
pub use retry::with_retry;
pub use writer::BatchWriter;
