//! Gap Analyzer
//!
//! Finds stretches of missing values between two present values of a curve.
//!
//! ## Walk (one curve)
//! ```text
//!   index:   0    1    2    3 .. 7    8    9   10
//!   value:   a    b    c    -    -    d    e    f
//!                      │◀── gap ───▶│
//!                 last_value     next value   size = 8 - 2
//! ```
//! Rows outside the curve's declared range are skipped and never open a gap.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::batch::read_range;
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{end_index, ensure_ordered, start_index, Delta, Direction, Index};
use crate::job::JobContext;
use crate::protocol::CurveRowSet;
use crate::report::{GapReportItem, Report, ReportItem};
use crate::store::{LogRef, LogStore, MnemonicRange};

/// Parameters of a gap analysis
#[derive(Debug, Clone, PartialEq)]
pub struct GapRequest {
    pub log: LogRef,

    /// Curves to analyze; empty analyzes every data curve
    pub mnemonics: Vec<String>,

    /// Smallest gap worth reporting, in the log's index unit
    pub threshold: Delta,

    /// Start override (raw index value)
    pub start: Option<String>,

    /// End override (raw index value)
    pub end: Option<String>,
}

impl GapRequest {
    pub fn new(log: LogRef, threshold: Delta) -> Self {
        Self {
            log,
            mnemonics: Vec::new(),
            threshold,
            start: None,
            end: None,
        }
    }

    pub fn mnemonics(mut self, mnemonics: Vec<String>) -> Self {
        self.mnemonics = mnemonics;
        self
    }

    pub fn range(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// Incremental gap detection over one curve, fed in fetch order
pub(crate) struct GapScanner<'a> {
    mnemonic: &'a str,
    direction: Direction,
    threshold: &'a Delta,
    last_value: Option<Index>,
    gap_inside: bool,
    points: usize,
}

impl<'a> GapScanner<'a> {
    pub(crate) fn new(mnemonic: &'a str, direction: Direction, threshold: &'a Delta) -> Self {
        Self {
            mnemonic,
            direction,
            threshold,
            last_value: None,
            gap_inside: false,
            points: 0,
        }
    }

    /// Feed one row; returns a gap when this value closes one at or above the threshold
    pub(crate) fn observe(&mut self, index: &Index, value: Option<&str>) -> Result<Option<GapReportItem>> {
        if value.is_none() {
            if self.last_value.is_some() {
                self.gap_inside = true;
            }
            return Ok(None);
        }

        self.points += 1;
        let mut found = None;
        if let (true, Some(last)) = (self.gap_inside, &self.last_value) {
            let size = if self.direction.is_increasing() {
                index.subtract(last)?
            } else {
                last.subtract(index)?
            };
            if size.compare(self.threshold)? != Ordering::Less {
                found = Some(GapReportItem {
                    mnemonic: self.mnemonic.to_string(),
                    start: last.clone(),
                    end: index.clone(),
                    size,
                });
            }
        }

        self.gap_inside = false;
        self.last_value = Some(index.clone());
        Ok(found)
    }

    /// Values seen so far
    pub(crate) fn points(&self) -> usize {
        self.points
    }
}

/// True when `index` should be considered for a curve with this declared range
pub(crate) fn within(range: Option<&MnemonicRange>, index: &Index) -> Result<bool> {
    match range {
        Some(range) => range.contains(index),
        None => Ok(true),
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Every gap at or above `threshold` in a fetched row set
///
/// Curves without an entry in `ranges` are not measured.
pub fn find_gaps(
    rows: &CurveRowSet,
    ranges: &HashMap<String, MnemonicRange>,
    direction: Direction,
    threshold: &Delta,
) -> Result<Vec<GapReportItem>> {
    let mut gaps = Vec::new();

    for (column, mnemonic) in rows.mnemonics().iter().enumerate() {
        let range = match ranges.get(mnemonic) {
            Some(range) => range,
            None => continue,
        };

        let mut scanner = GapScanner::new(mnemonic, direction, threshold);
        for row in rows.rows() {
            if !range.contains(&row.index)? {
                continue;
            }
            if let Some(gap) = scanner.observe(&row.index, row.value(column))? {
                gaps.push(gap);
            }
        }
    }

    Ok(gaps)
}

/// Fetch a log's data and report its gaps
pub async fn analyze_gaps(
    store: &dyn LogStore,
    request: &GapRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<Report> {
    let threshold = &request.threshold;
    if threshold.is_zero() || threshold.is_negative() {
        return Err(CurveError::Validation(format!(
            "gap size must be positive, got {}",
            threshold
        )));
    }

    let header = store.get_log_header(&request.log).await?;
    if threshold.index_type() != header.index_type {
        return Err(CurveError::Validation(format!(
            "a {} gap size cannot be used on a {} log",
            threshold.index_type(),
            header.index_type
        )));
    }
    threshold.ensure_unit(&header.index_uom)?;

    let start = start_index(&header, request.start.as_deref())?;
    let end = end_index(&header, request.end.as_deref())?;
    if let (Some(start), Some(end)) = (&start, &end) {
        ensure_ordered(start, end, header.direction)?;
    }

    ctx.check_cancelled()?;
    // Every curve is fetched: the store omits rows where all fetched curves
    // are empty, and those rows are what mark a gap in the selected ones
    let selected = header.select_mnemonics(&request.mnemonics);
    let rows = read_range(store, &header, header.data_mnemonics(), start, end, config).await?;
    ctx.report_progress(0.5);

    let mut ranges = header.mnemonic_ranges();
    ranges.retain(|mnemonic, _| selected.contains(mnemonic));
    let gaps = find_gaps(&rows, &ranges, header.direction, threshold)?;
    tracing::info!(log = %request.log, gaps = gaps.len(), "Gap analysis finished");
    ctx.report_progress(1.0);

    let summary = match gaps.len() {
        0 => format!("No gaps of {} or more in {}", threshold, header.describe()),
        n => format!("{} gaps of {} or more in {}", n, threshold, header.describe()),
    };
    Ok(Report::new(
        "Gap report",
        summary,
        gaps.into_iter().map(ReportItem::Gap).collect(),
    ))
}
