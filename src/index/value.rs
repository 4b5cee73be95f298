//! Index values
//!
//! Depth and timestamp positions with variant-checked arithmetic.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::{CurveError, Result};

use super::{Delta, Direction, IndexType};

/// Most decimal places a depth value can carry
const MAX_DEPTH_SCALE: u32 = 28;

/// Finest step a timestamp can take
fn time_epsilon() -> TimeDelta {
    TimeDelta::nanoseconds(1)
}

/// Next representable depth past `value`
///
/// The step shrinks to the finest decimal place that still changes the
/// value, so no representable depth lies strictly between the two.
fn next_depth(value: Decimal, increasing: bool) -> Decimal {
    for scale in (0..=MAX_DEPTH_SCALE).rev() {
        let step = Decimal::new(1, scale);
        let next = if increasing {
            value.checked_add(step)
        } else {
            value.checked_sub(step)
        };
        if let Some(next) = next {
            if next != value {
                return next;
            }
        }
    }
    value
}

/// A position on a log's primary index curve
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    /// Depth value and its unit of measure
    Depth { value: Decimal, uom: String },

    /// Timestamp, offset preserved as received
    DateTime(DateTime<FixedOffset>),
}

/// Totally ordered, hashable form of an [`Index`] for use as a map key
///
/// Depth keys are normalized, so `100.0` and `100` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Depth(Decimal),
    DateTime(DateTime<FixedOffset>),
}

impl Index {
    /// Create a depth index
    pub fn depth(value: Decimal, uom: impl Into<String>) -> Self {
        Index::Depth {
            value,
            uom: uom.into(),
        }
    }

    /// Parse a raw column value against the expected index type
    ///
    /// Depth values accept plain and scientific notation; time values must be
    /// RFC 3339 timestamps.
    pub fn parse(raw: &str, index_type: IndexType, uom: &str) -> Result<Self> {
        let raw = raw.trim();
        match index_type {
            IndexType::Depth => {
                let value = Decimal::from_str(raw)
                    .or_else(|_| Decimal::from_scientific(raw))
                    .map_err(|_| {
                        CurveError::Parse(format!("'{}' is not a depth value", raw))
                    })?;
                Ok(Index::depth(value, uom))
            }
            IndexType::DateTime => DateTime::parse_from_rfc3339(raw)
                .map(Index::DateTime)
                .map_err(|e| CurveError::Parse(format!("'{}' is not a timestamp: {}", raw, e))),
        }
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            Index::Depth { .. } => IndexType::Depth,
            Index::DateTime(_) => IndexType::DateTime,
        }
    }

    /// Unit of measure (empty for timestamps)
    pub fn uom(&self) -> &str {
        match self {
            Index::Depth { uom, .. } => uom,
            Index::DateTime(_) => "",
        }
    }

    /// Numeric/chronological comparison; fails on mixed variants
    pub fn compare(&self, other: &Index) -> Result<Ordering> {
        match (self, other) {
            (Index::Depth { value: a, .. }, Index::Depth { value: b, .. }) => Ok(a.cmp(b)),
            (Index::DateTime(a), Index::DateTime(b)) => Ok(a.cmp(b)),
            _ => Err(mismatch(self, other)),
        }
    }

    /// `self - other`
    pub fn subtract(&self, other: &Index) -> Result<Delta> {
        match (self, other) {
            (Index::Depth { value: a, uom }, Index::Depth { value: b, .. }) => {
                let value = a.checked_sub(*b).ok_or_else(|| {
                    CurveError::Data(format!("Depth difference {} - {} overflows", a, b))
                })?;
                Ok(Delta::depth(value, uom.clone()))
            }
            (Index::DateTime(a), Index::DateTime(b)) => Ok(Delta::Time(a.signed_duration_since(*b))),
            _ => Err(mismatch(self, other)),
        }
    }

    /// Shift this index by a constant delta
    ///
    /// Depth arithmetic is exact decimal arithmetic.
    pub fn offset(&self, delta: &Delta) -> Result<Index> {
        match (self, delta) {
            (Index::Depth { value, uom }, Delta::Depth { value: step, .. }) => {
                let shifted = value.checked_add(*step).ok_or_else(|| {
                    CurveError::Data(format!("Depth {} + {} overflows", value, step))
                })?;
                Ok(Index::depth(shifted, uom.clone()))
            }
            (Index::DateTime(at), Delta::Time(step)) => at
                .checked_add_signed(*step)
                .map(Index::DateTime)
                .ok_or_else(|| CurveError::Data(format!("Timestamp {} + {} overflows", at, step))),
            _ => Err(CurveError::TypeMismatch(format!(
                "cannot offset a {} index by a {} delta",
                self.index_type(),
                delta.index_type()
            ))),
        }
    }

    /// The smallest index strictly past this one in the direction of travel
    pub fn epsilon_advance(&self, direction: Direction) -> Index {
        match self {
            Index::Depth { value, uom } => {
                Index::depth(next_depth(*value, direction.is_increasing()), uom.clone())
            }
            Index::DateTime(at) => {
                let step = if direction.is_increasing() {
                    time_epsilon()
                } else {
                    -time_epsilon()
                };
                Index::DateTime(at.checked_add_signed(step).unwrap_or(*at))
            }
        }
    }

    /// Like [`Index::epsilon_advance`], for a store keeping `places` decimals of depth
    ///
    /// Depth moves one unit in the last kept place; nothing the store can
    /// hold lies in between. Timestamps and `None` use the finest step.
    pub fn advance_at_precision(&self, direction: Direction, places: Option<u32>) -> Index {
        match (self, places) {
            (Index::Depth { value, uom }, Some(places)) => {
                let step = Decimal::new(1, places.min(MAX_DEPTH_SCALE));
                let next = if direction.is_increasing() {
                    value.saturating_add(step)
                } else {
                    value.saturating_sub(step)
                };
                Index::depth(next, uom.clone())
            }
            _ => self.epsilon_advance(direction),
        }
    }

    /// Decimal places of a depth value, trailing zeros ignored (0 for timestamps)
    pub fn decimal_places(&self) -> u32 {
        match self {
            Index::Depth { value, .. } => value.normalize().scale(),
            Index::DateTime(_) => 0,
        }
    }

    /// Map key for this index
    pub fn key(&self) -> IndexKey {
        match self {
            Index::Depth { value, .. } => IndexKey::Depth(value.normalize()),
            Index::DateTime(at) => IndexKey::DateTime(*at),
        }
    }
}

fn mismatch(a: &Index, b: &Index) -> CurveError {
    CurveError::TypeMismatch(format!(
        "cannot combine a {} index with a {} index",
        a.index_type(),
        b.index_type()
    ))
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Depth { value, .. } => write!(f, "{}", value),
            Index::DateTime(at) => write!(f, "{}", at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl Serialize for Index {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
