//! Index deltas
//!
//! The typed difference between two indexes of the same variant.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::error::{CurveError, Result};

use super::IndexType;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Difference between two indexes
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// Depth difference in the unit of the left-hand index
    Depth { value: Decimal, uom: String },

    /// Time difference
    Time(TimeDelta),
}

impl Delta {
    pub fn depth(value: Decimal, uom: impl Into<String>) -> Self {
        Delta::Depth {
            value,
            uom: uom.into(),
        }
    }

    pub fn time(delta: TimeDelta) -> Self {
        Delta::Time(delta)
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            Delta::Depth { .. } => IndexType::Depth,
            Delta::Time(_) => IndexType::DateTime,
        }
    }

    /// Compare two deltas of the same variant
    pub fn compare(&self, other: &Delta) -> Result<Ordering> {
        match (self, other) {
            (Delta::Depth { value: a, .. }, Delta::Depth { value: b, .. }) => Ok(a.cmp(b)),
            (Delta::Time(a), Delta::Time(b)) => Ok(a.cmp(b)),
            _ => Err(CurveError::TypeMismatch(format!(
                "cannot compare a {} delta with a {} delta",
                self.index_type(),
                other.index_type()
            ))),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Delta::Depth { value, .. } => value.is_zero(),
            Delta::Time(delta) => delta.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Delta::Depth { value, .. } => value.is_sign_negative() && !value.is_zero(),
            Delta::Time(delta) => *delta < TimeDelta::zero(),
        }
    }

    pub fn abs(&self) -> Delta {
        match self {
            Delta::Depth { value, uom } => Delta::depth(value.abs(), uom.clone()),
            Delta::Time(delta) => Delta::Time(delta.abs()),
        }
    }

    /// Absolute size as a number: depth units, or hours for time
    pub fn magnitude(&self) -> Decimal {
        match self {
            Delta::Depth { value, .. } => value.abs(),
            Delta::Time(delta) => {
                Decimal::from(delta.num_milliseconds().abs()) / Decimal::from(MILLIS_PER_HOUR)
            }
        }
    }

    /// Fail with `Validation` unless a depth delta is given in `uom`
    ///
    /// A depth delta without a unit is taken to be in any unit; time deltas
    /// always pass.
    pub fn ensure_unit(&self, uom: &str) -> Result<()> {
        match self {
            Delta::Depth { uom: own, .. } if !own.is_empty() && !own.eq_ignore_ascii_case(uom) => {
                Err(CurveError::Validation(format!(
                    "a delta in '{}' cannot be applied to an index in '{}'",
                    own, uom
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Neg for Delta {
    type Output = Delta;

    fn neg(self) -> Delta {
        match self {
            Delta::Depth { value, uom } => Delta::Depth { value: -value, uom },
            Delta::Time(delta) => Delta::Time(-delta),
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Depth { value, uom } if uom.is_empty() => write!(f, "{}", value),
            Delta::Depth { value, uom } => write!(f, "{} {}", value, uom),
            Delta::Time(delta) => write!(f, "{}", delta),
        }
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
