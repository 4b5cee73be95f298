//! Header/Data Consistency Checker
//!
//! Compares the boundaries a log header declares with the boundaries found
//! in its data.
//!
//! ## Fetches
//! ```text
//!   header            ── declared start/end, per-curve min/max
//!   first row         ── all curves, from declared start, one row
//!   latest values     ── one value per curve
//!   backfill (each)   ── curves empty in the first row, one row each, concurrent
//! ```
//! Depth boundaries are compared as exact strings; time boundaries are
//! parsed first so formatting differences do not count.

use std::cmp::Ordering;

use futures::future::join_all;

use crate::error::Result;
use crate::index::{Index, IndexType};
use crate::job::JobContext;
use crate::protocol::{decode_batch, CurveRowSet};
use crate::report::{ConsistencyReportItem, Report, ReportItem};
use crate::store::{DataQuery, LogCurveInfo, LogHeader, LogRef, LogStore};

/// Parameters of a consistency check
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyRequest {
    pub log: LogRef,
}

impl ConsistencyRequest {
    pub fn new(log: LogRef) -> Self {
        Self { log }
    }
}

/// True when two boundaries are the same for this index type
pub fn same_boundary(index_type: IndexType, a: Option<&Index>, b: Option<&Index>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => match index_type {
            IndexType::Depth => a.to_string() == b.to_string(),
            IndexType::DateTime => matches!(a.compare(b), Ok(Ordering::Equal)),
        },
        _ => false,
    }
}

/// Check one log's header against its data
pub async fn check_header(
    store: &dyn LogStore,
    request: &ConsistencyRequest,
    ctx: &JobContext,
) -> Result<Report> {
    let header = store.get_log_header(&request.log).await?;
    let index_type = header.index_type;

    let first_query = DataQuery::new(header.log.clone(), Vec::new())
        .start(header.start_index.clone())
        .max_rows(1);
    let first = decode_batch(&store.get_log_data(&first_query).await?, index_type)?;

    let latest_query = DataQuery::new(header.log.clone(), Vec::new()).latest_values(1);
    let latest = decode_batch(&store.get_log_data(&latest_query).await?, index_type)?;
    ctx.report_progress(0.4);
    ctx.check_cancelled()?;

    let mut items = Vec::new();

    let data_start = first.first().map(|row| row.index.clone());
    let data_end = latest.last().map(|row| row.index.clone());
    if !same_boundary(index_type, header.start_index.as_ref(), data_start.as_ref())
        || !same_boundary(index_type, header.end_index.as_ref(), data_end.as_ref())
    {
        items.push(item(
            &header.index_curve,
            header.start_index.as_ref(),
            header.end_index.as_ref(),
            data_start.as_ref(),
            data_end.as_ref(),
        ));
    }

    let curves: Vec<&LogCurveInfo> = header
        .curves
        .iter()
        .filter(|c| !header.is_index_curve(&c.mnemonic))
        .collect();

    // Curves without a value in the first row need their own first index
    let missing: Vec<&str> = curves
        .iter()
        .map(|c| c.mnemonic.as_str())
        .filter(|m| first.first().and_then(|row| first.value(row, m)).is_none())
        .collect();
    let backfilled: Vec<Option<Index>> = join_all(missing.iter().map(|m| first_index(store, &header, m)))
        .await
        .into_iter()
        .collect::<Result<_>>()?;

    for curve in curves {
        let mnemonic = curve.mnemonic.as_str();
        let data_start = match missing.iter().position(|m| *m == mnemonic) {
            Some(slot) => backfilled[slot].clone(),
            None => data_start.clone(),
        };
        let data_end = last_index(&latest, mnemonic);

        let (header_start, header_end) = declared_bounds(&header, curve);
        if !same_boundary(index_type, header_start, data_start.as_ref())
            || !same_boundary(index_type, header_end, data_end.as_ref())
        {
            items.push(item(
                mnemonic,
                header_start,
                header_end,
                data_start.as_ref(),
                data_end.as_ref(),
            ));
        }
    }
    ctx.report_progress(1.0);

    tracing::info!(log = %request.log, mismatches = items.len(), "Consistency check finished");

    let summary = match items.len() {
        0 => format!("Header and data agree for {}", header.describe()),
        n => format!("{} header/data mismatches in {}", n, header.describe()),
    };
    Ok(Report::new(
        "Header/data consistency",
        summary,
        items.into_iter().map(ReportItem::Consistency).collect(),
    ))
}

/// Declared start/end of a curve in the direction of travel
fn declared_bounds<'a>(header: &LogHeader, curve: &'a LogCurveInfo) -> (Option<&'a Index>, Option<&'a Index>) {
    if header.direction.is_increasing() {
        (curve.min_index.as_ref(), curve.max_index.as_ref())
    } else {
        (curve.max_index.as_ref(), curve.min_index.as_ref())
    }
}

/// First index carrying a value for one curve
async fn first_index(store: &dyn LogStore, header: &LogHeader, mnemonic: &str) -> Result<Option<Index>> {
    let query = DataQuery::new(header.log.clone(), vec![mnemonic.to_string()])
        .start(header.start_index.clone())
        .max_rows(1);
    let rows = decode_batch(&store.get_log_data(&query).await?, header.index_type)?;
    tracing::debug!(log = %header.log, mnemonic, found = !rows.is_empty(), "Backfilled first index");
    Ok(rows.first().map(|row| row.index.clone()))
}

/// Last latest-values row carrying a value for one curve
fn last_index(latest: &CurveRowSet, mnemonic: &str) -> Option<Index> {
    latest
        .rows()
        .iter()
        .rev()
        .find(|row| latest.value(row, mnemonic).is_some())
        .map(|row| row.index.clone())
}

fn item(
    mnemonic: &str,
    header_start: Option<&Index>,
    header_end: Option<&Index>,
    data_start: Option<&Index>,
    data_end: Option<&Index>,
) -> ConsistencyReportItem {
    ConsistencyReportItem {
        mnemonic: mnemonic.to_string(),
        header_start: header_start.map(Index::to_string),
        header_end: header_end.map(Index::to_string),
        data_start: data_start.map(Index::to_string),
        data_end: data_end.map(Index::to_string),
    }
}
