//! Log Data Comparator
//!
//! Diffs the curve data of two logs, possibly held by two stores.
//!
//! ## Plan
//! ```text
//!   shared curves      ── read both sides, union index keys, diff values
//!   source-only curves ── every source value is a mismatch
//!   target-only curves ── every target value is a mismatch
//! ```
//! Curves are processed in waves of `compare_concurrency`. Every curve task
//! returns its own items (never more than cap + 1) and the coordinator folds
//! them in curve order, stopping once the cap is exceeded.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use futures::future::join_all;
use rust_decimal::Decimal;

use crate::batch::read_range;
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{Direction, Index, IndexKey, IndexType};
use crate::job::JobContext;
use crate::protocol::CurveRowSet;
use crate::report::{CompareReportItem, Report, ReportItem};
use crate::store::{LogHeader, LogRef, LogStore};

/// Parameters of a log data comparison
#[derive(Debug, Clone, PartialEq)]
pub struct CompareRequest {
    /// Log read from the source store
    pub source: LogRef,

    /// Log read from the target store
    pub target: LogRef,
}

impl CompareRequest {
    pub fn new(source: LogRef, target: LogRef) -> Self {
        Self { source, target }
    }
}

/// Which sides of the comparison hold a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Both,
    SourceOnly,
    TargetOnly,
}

/// Two values are equal when the strings match or both parse to the same decimal
pub fn values_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (parse_number(a), parse_number(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Plain or scientific notation, the same forms a depth index accepts
fn parse_number(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Mismatches of one curve between two fetched row sets, in direction order
///
/// A missing set stands for a curve that one side does not have. At most
/// `limit` items are returned.
pub fn diff_curve(
    mnemonic: &str,
    source: Option<&CurveRowSet>,
    target: Option<&CurveRowSet>,
    direction: Direction,
    limit: usize,
) -> Vec<CompareReportItem> {
    let source_values = values_by_key(source, mnemonic);
    let target_values = values_by_key(target, mnemonic);

    let keys: BTreeSet<IndexKey> = source_values
        .keys()
        .chain(target_values.keys())
        .copied()
        .collect();
    let ordered: Box<dyn Iterator<Item = &IndexKey>> = if direction.is_increasing() {
        Box::new(keys.iter())
    } else {
        Box::new(keys.iter().rev())
    };

    let mut items = Vec::new();
    for key in ordered {
        let source_entry = source_values.get(key);
        let target_entry = target_values.get(key);
        let index = match (source_entry, target_entry) {
            (Some((_, s)), Some((_, t))) if values_equal(s, t) => continue,
            (Some((index, _)), _) | (None, Some((index, _))) => (*index).clone(),
            (None, None) => continue,
        };

        items.push(CompareReportItem {
            mnemonic: mnemonic.to_string(),
            index,
            source_value: source_entry.map(|(_, v)| v.to_string()),
            target_value: target_entry.map(|(_, v)| v.to_string()),
        });
        if items.len() >= limit {
            break;
        }
    }
    items
}

fn values_by_key<'a>(set: Option<&'a CurveRowSet>, mnemonic: &str) -> BTreeMap<IndexKey, (&'a Index, &'a str)> {
    match set {
        Some(set) => set
            .curve_values(mnemonic)
            .map(|(index, value)| (index.key(), (index, value)))
            .collect(),
        None => BTreeMap::new(),
    }
}

/// Add per-curve results to `items` until the cap is exceeded
///
/// Returns true when the result had to be truncated.
fn fold(items: &mut Vec<CompareReportItem>, results: Vec<Vec<CompareReportItem>>, cap: usize) -> bool {
    for result in results {
        for item in result {
            if items.len() >= cap {
                return true;
            }
            items.push(item);
        }
    }
    false
}

/// Compare the curve data of a source log and a target log
pub async fn compare_log_data(
    source_store: &dyn LogStore,
    target_store: &dyn LogStore,
    request: &CompareRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<Report> {
    let source = source_store.get_log_header(&request.source).await?;
    let target = target_store.get_log_header(&request.target).await?;
    check_preconditions(source_store, target_store, &source, &target).await?;

    let plan = plan_curves(&source, &target);
    let cap = config.mismatch_cap;
    let limit = cap.saturating_add(1);

    let mut items = Vec::new();
    let mut truncated = false;
    let mut done = 0;

    for wave in plan.chunks(config.compare_concurrency.max(1)) {
        ctx.check_cancelled()?;

        let tasks = wave.iter().map(|(mnemonic, presence)| {
            diff_task(
                source_store,
                target_store,
                &source,
                &target,
                mnemonic,
                *presence,
                limit,
                config,
            )
        });
        let results = join_all(tasks).await.into_iter().collect::<Result<Vec<_>>>()?;

        done += wave.len();
        ctx.report_progress(done as f64 / plan.len() as f64);

        if fold(&mut items, results, cap) {
            truncated = true;
            break;
        }
    }

    tracing::info!(
        source = %request.source,
        target = %request.target,
        curves = plan.len(),
        mismatches = items.len(),
        truncated,
        "Log data comparison finished"
    );

    let summary = format!(
        "{} mismatches between {} and {}",
        items.len(),
        source.describe(),
        target.describe()
    );
    let report = Report::new(
        "Log data comparison",
        summary,
        items.into_iter().map(ReportItem::Compare).collect(),
    );

    if truncated {
        tracing::warn!(cap, "Mismatch cap reached, comparison stopped");
        return Ok(report.with_warning(format!(
            "Comparison stopped after {} mismatches; the report is incomplete",
            cap
        )));
    }
    Ok(report)
}

async fn check_preconditions(
    source_store: &dyn LogStore,
    target_store: &dyn LogStore,
    source: &LogHeader,
    target: &LogHeader,
) -> Result<()> {
    if source.index_type != target.index_type {
        return Err(CurveError::Validation(format!(
            "cannot compare a {} log with a {} log",
            source.index_type, target.index_type
        )));
    }
    if source.direction != target.direction {
        return Err(CurveError::Precondition(format!(
            "cannot compare logs of {} and {} direction",
            source.direction, target.direction
        )));
    }
    if source.index_type == IndexType::Depth {
        let source_precision = source_store.capabilities().await?.depth_decimal_precision;
        let target_precision = target_store.capabilities().await?.depth_decimal_precision;
        if source_precision != target_precision {
            return Err(CurveError::Precondition(format!(
                "depth decimal precision differs between stores ({:?} vs {:?})",
                source_precision, target_precision
            )));
        }
    }
    Ok(())
}

/// Every curve to compare: shared ones in source order, then one-sided ones
fn plan_curves(source: &LogHeader, target: &LogHeader) -> Vec<(String, Presence)> {
    let source_curves = source.data_mnemonics();
    let target_curves = target.data_mnemonics();

    let mut plan: Vec<(String, Presence)> = source_curves
        .iter()
        .filter(|m| target_curves.contains(m))
        .map(|m| (m.clone(), Presence::Both))
        .collect();
    plan.extend(
        source_curves
            .iter()
            .filter(|m| !target_curves.contains(m))
            .map(|m| (m.clone(), Presence::SourceOnly)),
    );
    plan.extend(
        target_curves
            .iter()
            .filter(|m| !source_curves.contains(m))
            .map(|m| (m.clone(), Presence::TargetOnly)),
    );
    plan
}

#[allow(clippy::too_many_arguments)]
async fn diff_task(
    source_store: &dyn LogStore,
    target_store: &dyn LogStore,
    source: &LogHeader,
    target: &LogHeader,
    mnemonic: &str,
    presence: Presence,
    limit: usize,
    config: &Config,
) -> Result<Vec<CompareReportItem>> {
    let (source_rows, target_rows) = match presence {
        Presence::Both => {
            let (s, t) = futures::try_join!(
                read_curve(source_store, source, mnemonic, config),
                read_curve(target_store, target, mnemonic, config)
            )?;
            (Some(s), Some(t))
        }
        Presence::SourceOnly => (Some(read_curve(source_store, source, mnemonic, config).await?), None),
        Presence::TargetOnly => (None, Some(read_curve(target_store, target, mnemonic, config).await?)),
    };

    let items = diff_curve(
        mnemonic,
        source_rows.as_ref(),
        target_rows.as_ref(),
        source.direction,
        limit,
    );
    tracing::debug!(mnemonic, ?presence, mismatches = items.len(), "Compared curve");
    Ok(items)
}

async fn read_curve(
    store: &dyn LogStore,
    header: &LogHeader,
    mnemonic: &str,
    config: &Config,
) -> Result<CurveRowSet> {
    read_range(store, header, vec![mnemonic.to_string()], None, None, config).await
}
