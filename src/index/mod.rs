//! Index Module
//!
//! Positions on a log's primary index curve and the arithmetic between them.
//!
//! ## Responsibilities
//! - Depth and timestamp indexes as one tagged union
//! - Variant-checked comparison and subtraction (yielding a Delta)
//! - Epsilon-advance used to page past the last fetched row
//! - Direction-aware ordering for increasing and decreasing logs
//! - Start/End resolution from header metadata or an override string
//!
//! ## Ordering
//! ```text
//!   Increasing:   start ──▶ end      (start <= end)
//!                  0     2     8    10
//!
//!   Decreasing:   start ──▶ end      (start >= end)
//!                 10     8     2     0
//! ```
//! Every threshold comparison in the algorithms goes through
//! [`Direction::order`], so `>=` and `<=` flip with the direction of travel.

mod bounds;
mod delta;
mod value;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CurveError, Result};

pub use bounds::{end_index, ensure_ordered, start_index};
pub use delta::Delta;
pub use value::{Index, IndexKey};

/// Kind of primary index a log is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Measured depth (decimal value with a unit of measure)
    Depth,

    /// Timestamp with offset
    DateTime,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexType::Depth => write!(f, "depth"),
            IndexType::DateTime => write!(f, "date time"),
        }
    }
}

impl FromStr for IndexType {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depth" | "measured depth" => Ok(IndexType::Depth),
            "time" | "datetime" | "date time" => Ok(IndexType::DateTime),
            other => Err(CurveError::Parse(format!("Unknown index type: {}", other))),
        }
    }
}

/// Whether successive index values increase or decrease along the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    pub fn is_increasing(self) -> bool {
        matches!(self, Direction::Increasing)
    }

    /// The opposite direction of travel
    pub fn reversed(self) -> Self {
        match self {
            Direction::Increasing => Direction::Decreasing,
            Direction::Decreasing => Direction::Increasing,
        }
    }

    /// Order `a` relative to `b` along the direction of travel
    ///
    /// `Less` means `a` is reached before `b`.
    pub fn order(self, a: &Index, b: &Index) -> Result<Ordering> {
        let ordering = a.compare(b)?;
        Ok(self.orient(ordering))
    }

    /// Same as [`Direction::order`] for keys that are already known to share a variant
    pub fn order_keys(self, a: &IndexKey, b: &IndexKey) -> Ordering {
        self.orient(a.cmp(b))
    }

    fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Increasing => ordering,
            Direction::Decreasing => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increasing => write!(f, "increasing"),
            Direction::Decreasing => write!(f, "decreasing"),
        }
    }
}
