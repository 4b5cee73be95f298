//! Minimum-Data QC
//!
//! Checks that each selected curve exists, has data, has no large gap and
//! is dense enough over the checked range.
//!
//! ## Issues
//! - `NOT_FOUND`: curve missing from the header
//! - `NO_DATA`: no value in the range
//! - `LARGE_GAP`: first gap at or above the threshold (later ones are ignored)
//! - `LOW_DENSITY`: points / |end - start| below the threshold (per hour for time logs)

use chrono::TimeDelta;
use rust_decimal::Decimal;

use crate::batch::read_range;
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{end_index, ensure_ordered, start_index, Delta, Direction, Index};
use crate::job::JobContext;
use crate::protocol::CurveRowSet;
use crate::report::{QcIssue, QcReportItem, Report, ReportItem};
use crate::store::{LogHeader, LogRef, LogStore, MnemonicRange};

use super::gap::{within, GapScanner};

/// Parameters of a minimum-data QC run
#[derive(Debug, Clone, PartialEq)]
pub struct QcRequest {
    pub log: LogRef,

    /// Curves to check; empty checks every data curve
    pub mnemonics: Vec<String>,

    pub start: Option<String>,
    pub end: Option<String>,

    /// Required points per index unit (per hour for time logs)
    pub density: Option<Decimal>,

    /// Largest tolerated gap on a depth log
    pub depth_gap: Option<Decimal>,

    /// Largest tolerated gap on a time log
    pub time_gap: Option<TimeDelta>,
}

impl QcRequest {
    pub fn new(log: LogRef, mnemonics: Vec<String>) -> Self {
        Self {
            log,
            mnemonics,
            start: None,
            end: None,
            density: None,
            depth_gap: None,
            time_gap: None,
        }
    }

    pub fn density(mut self, density: Decimal) -> Self {
        self.density = Some(density);
        self
    }

    pub fn depth_gap(mut self, gap: Decimal) -> Self {
        self.depth_gap = Some(gap);
        self
    }

    pub fn time_gap(mut self, gap: TimeDelta) -> Self {
        self.time_gap = Some(gap);
        self
    }

    pub fn range(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Check the thresholds; returns the density and gap thresholds
    ///
    /// The depth gap carries no unit yet; it takes the log's unit once the
    /// header is known.
    pub fn validate(&self) -> Result<(Decimal, Delta)> {
        let density = match self.density {
            Some(density) if density > Decimal::ZERO => density,
            Some(density) => {
                return Err(CurveError::Validation(format!(
                    "density threshold must be positive, got {}",
                    density
                )))
            }
            None => {
                return Err(CurveError::Validation(
                    "density threshold is required".to_string(),
                ))
            }
        };

        let gap = match (self.depth_gap, self.time_gap) {
            (Some(depth), None) if depth > Decimal::ZERO => Delta::depth(depth, ""),
            (None, Some(time)) if time > TimeDelta::zero() => Delta::time(time),
            (Some(_), Some(_)) => {
                return Err(CurveError::Validation(
                    "set either a depth gap or a time gap, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(CurveError::Validation(
                    "a depth gap or a time gap is required".to_string(),
                ))
            }
            _ => {
                return Err(CurveError::Validation(
                    "gap threshold must be positive".to_string(),
                ))
            }
        };

        Ok((density, gap))
    }
}

/// QC of one curve over already fetched rows
///
/// `span` is the magnitude of the checked range; a zero span skips the
/// density check.
pub fn check_curve(
    rows: &CurveRowSet,
    mnemonic: &str,
    range: Option<&MnemonicRange>,
    direction: Direction,
    gap: &Delta,
    density: Decimal,
    span: Decimal,
) -> Result<QcReportItem> {
    let mut item = QcReportItem::new(mnemonic);
    let column = rows.column(mnemonic);

    let mut scanner = GapScanner::new(mnemonic, direction, gap);
    for row in rows.rows() {
        if !within(range, &row.index)? {
            continue;
        }
        let found = scanner.observe(&row.index, column.and_then(|col| row.value(col)))?;
        if item.large_gap.is_none() {
            item.large_gap = found;
        }
    }

    item.data_points = scanner.points();
    if item.data_points == 0 {
        item.issues.push(QcIssue::NoData);
        return Ok(item);
    }

    if item.large_gap.is_some() {
        item.issues.push(QcIssue::LargeGap);
    }

    if !span.is_zero() {
        if let Some(measured) = Decimal::from(item.data_points).checked_div(span) {
            let measured = measured.round_dp(6);
            if measured < density {
                item.issues.push(QcIssue::LowDensity);
            }
            item.density = Some(measured);
        }
    }

    Ok(item)
}

/// Run the minimum-data QC on one log
pub async fn minimum_data_qc(
    store: &dyn LogStore,
    request: &QcRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<Report> {
    let (density, gap) = request.validate()?;

    let header = store.get_log_header(&request.log).await?;
    if gap.index_type() != header.index_type {
        return Err(CurveError::Validation(format!(
            "a {} gap threshold cannot be used on a {} log",
            gap.index_type(),
            header.index_type
        )));
    }
    let gap = match gap {
        Delta::Depth { value, .. } => Delta::depth(value, header.index_uom.clone()),
        time => time,
    };

    let start = start_index(&header, request.start.as_deref())?;
    let end = end_index(&header, request.end.as_deref())?;
    if let (Some(start), Some(end)) = (&start, &end) {
        ensure_ordered(start, end, header.direction)?;
    }

    let requested = requested_mnemonics(&header, &request.mnemonics);
    let present = header.select_mnemonics(&requested);

    ctx.check_cancelled()?;
    // All curves, so rows where only the checked ones are empty still arrive
    let rows = read_range(store, &header, header.data_mnemonics(), start.clone(), end.clone(), config).await?;
    ctx.report_progress(0.5);

    let span = span_of(start.as_ref(), end.as_ref(), &rows)?;
    let ranges = header.mnemonic_ranges();

    let mut items = Vec::new();
    for mnemonic in &requested {
        if !present.contains(mnemonic) {
            let mut item = QcReportItem::new(mnemonic.clone());
            item.issues.push(QcIssue::NotFound);
            items.push(item);
            continue;
        }

        let item = check_curve(
            &rows,
            mnemonic,
            ranges.get(mnemonic),
            header.direction,
            &gap,
            density,
            span,
        )?;
        if !item.issues.is_empty() {
            items.push(item);
        }
    }
    ctx.report_progress(1.0);

    tracing::info!(
        log = %request.log,
        checked = requested.len(),
        flagged = items.len(),
        "Minimum data QC finished"
    );

    let summary = format!(
        "{} of {} curves failed QC in {}",
        items.len(),
        requested.len(),
        header.describe()
    );
    Ok(Report::new(
        "Minimum data QC",
        summary,
        items.into_iter().map(ReportItem::Qc).collect(),
    ))
}

/// Requested curves, deduplicated, without the index curve
///
/// An empty request means every data curve of the header.
fn requested_mnemonics(header: &LogHeader, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return header.data_mnemonics();
    }
    let mut out: Vec<String> = Vec::new();
    for mnemonic in requested {
        if !header.is_index_curve(mnemonic) && !out.contains(mnemonic) {
            out.push(mnemonic.clone());
        }
    }
    out
}

/// Size of the checked range; open bounds fall back to the fetched rows
fn span_of(start: Option<&Index>, end: Option<&Index>, rows: &CurveRowSet) -> Result<Decimal> {
    let start = start.or_else(|| rows.first().map(|r| &r.index));
    let end = end.or_else(|| rows.last().map(|r| &r.index));
    match (start, end) {
        (Some(start), Some(end)) => Ok(end.subtract(start)?.magnitude()),
        _ => Ok(Decimal::ZERO),
    }
}
