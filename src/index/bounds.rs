//! Start/End resolution
//!
//! A log's effective boundaries come from an explicit override when one is
//! given, otherwise from the header.

use std::cmp::Ordering;

use crate::error::{CurveError, Result};
use crate::store::LogHeader;

use super::{Direction, Index};

/// Effective start index of a log
///
/// A non-blank override is parsed against the log's index type and unit and
/// wins over the header's own start.
pub fn start_index(header: &LogHeader, override_value: Option<&str>) -> Result<Option<Index>> {
    resolve(header, override_value, header.start_index.as_ref())
}

/// Effective end index of a log (see [`start_index`])
pub fn end_index(header: &LogHeader, override_value: Option<&str>) -> Result<Option<Index>> {
    resolve(header, override_value, header.end_index.as_ref())
}

fn resolve(
    header: &LogHeader,
    override_value: Option<&str>,
    fallback: Option<&Index>,
) -> Result<Option<Index>> {
    match override_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => Index::parse(raw, header.index_type, &header.index_uom).map(Some),
        None => Ok(fallback.cloned()),
    }
}

/// Fail with a data error unless `start` comes no later than `end`
pub fn ensure_ordered(start: &Index, end: &Index, direction: Direction) -> Result<()> {
    if direction.order(start, end)? == Ordering::Greater {
        return Err(CurveError::Data(format!(
            "start index {} is past end index {} for a {} log",
            start, end, direction
        )));
    }
    Ok(())
}
