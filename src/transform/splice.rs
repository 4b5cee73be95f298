//! Splicer
//!
//! Merges the curves of several logs into one new log.
//!
//! ## Overlap Rule
//! ```text
//!   accumulated GR:        [100 ─────────── 200]
//!   next log's GR:    [50 ─────── 150]  [180 ────── 260]
//!   written:          [50..100)                 (200..260]
//! ```
//! A value from a later log is only taken when its index lies outside the
//! window already covered for that curve, so earlier logs win inside their
//! coverage and later logs extend it. The window of a curve is measured
//! before that log's values for the curve are merged.

use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;

use crate::batch::{read_range, with_retry, BatchWriter};
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{Direction, Index, IndexKey, IndexType};
use crate::job::{JobContext, JobOutcome, RefreshAction};
use crate::protocol::{CurveRow, CurveRowSet};
use crate::store::{LogCurveInfo, LogHeader, LogRef, LogStore};

/// Share of the progress bar spent merging; the rest is writing
const MERGE_SHARE: f64 = 0.8;

/// Parameters of a splice
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceRequest {
    /// Input logs, in merge order
    pub logs: Vec<LogRef>,

    /// Uid of the new log (created in the first input's wellbore)
    pub new_uid: String,

    /// Name of the new log
    pub new_name: String,
}

impl SpliceRequest {
    pub fn new(logs: Vec<LogRef>, new_uid: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            logs,
            new_uid: new_uid.into(),
            new_name: new_name.into(),
        }
    }
}

/// Rows being assembled by a splice, keyed by index
pub struct SpliceAccumulator {
    direction: Direction,
    rows: BTreeMap<IndexKey, (Index, HashMap<String, String>)>,
    /// Covered [min, max] per curve
    windows: HashMap<String, (IndexKey, IndexKey)>,
}

impl SpliceAccumulator {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            rows: BTreeMap::new(),
            windows: HashMap::new(),
        }
    }

    /// Merge one curve's values, returning how many were taken
    pub fn merge_curve<'a, I>(&mut self, mnemonic: &str, values: I) -> usize
    where
        I: IntoIterator<Item = (&'a Index, &'a str)>,
    {
        let window = self.windows.get(mnemonic).copied();
        let mut covered = window;
        let mut taken = 0;

        for (index, value) in values {
            let key = index.key();
            if let Some((low, high)) = window {
                if key >= low && key <= high {
                    continue;
                }
            }

            self.rows
                .entry(key)
                .or_insert_with(|| (index.clone(), HashMap::new()))
                .1
                .insert(mnemonic.to_string(), value.to_string());
            covered = Some(match covered {
                Some((low, high)) => (low.min(key), high.max(key)),
                None => (key, key),
            });
            taken += 1;
        }

        if let Some(covered) = covered {
            self.windows.insert(mnemonic.to_string(), covered);
        }
        taken
    }

    /// Covered window of a curve as (min key, max key)
    pub fn window(&self, mnemonic: &str) -> Option<(IndexKey, IndexKey)> {
        self.windows.get(mnemonic).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for the given columns, sorted in the direction of travel
    pub fn into_row_set(self, mut set: CurveRowSet) -> CurveRowSet {
        let columns: Vec<String> = set.mnemonics().to_vec();
        let mut rows: Vec<CurveRow> = self
            .rows
            .into_values()
            .map(|(index, mut values)| {
                let values = columns
                    .iter()
                    .map(|m| values.remove(m).unwrap_or_default())
                    .collect();
                CurveRow::new(index, values)
            })
            .collect();
        if !self.direction.is_increasing() {
            rows.reverse();
        }
        for row in rows {
            set.push(row);
        }
        set
    }
}

/// Curve definitions of the spliced log: index curve first, then data curves
///
/// Curves are grouped by mnemonic in order of first appearance; the last
/// log defining a curve wins. The index curve is the last log's.
pub fn merge_curve_infos(headers: &[LogHeader]) -> Vec<LogCurveInfo> {
    let last = match headers.last() {
        Some(last) => last,
        None => return Vec::new(),
    };
    let index_curves: Vec<&str> = headers.iter().map(|h| h.index_curve.as_str()).collect();

    let mut order: Vec<String> = Vec::new();
    let mut definitions: HashMap<String, LogCurveInfo> = HashMap::new();
    for header in headers {
        for curve in &header.curves {
            if index_curves.contains(&curve.mnemonic.as_str()) {
                continue;
            }
            if !definitions.contains_key(&curve.mnemonic) {
                order.push(curve.mnemonic.clone());
            }
            definitions.insert(
                curve.mnemonic.clone(),
                LogCurveInfo::new(curve.mnemonic.clone(), curve.unit.clone()),
            );
        }
    }

    let index_unit = last
        .curve(&last.index_curve)
        .map(|c| c.unit.clone())
        .unwrap_or_else(|| last.index_uom.clone());
    let mut curves = vec![LogCurveInfo::new(last.index_curve.clone(), index_unit)];
    curves.extend(order.into_iter().filter_map(|m| definitions.remove(&m)));
    curves
}

/// Splice the input logs into a new log
pub async fn splice_logs(
    store: &dyn LogStore,
    request: &SpliceRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<JobOutcome> {
    if request.logs.is_empty() {
        return Err(CurveError::Validation("at least one log is required".to_string()));
    }
    if request.new_uid.trim().is_empty() {
        return Err(CurveError::Validation("the new log needs a uid".to_string()));
    }

    let mut headers = Vec::with_capacity(request.logs.len());
    for log in &request.logs {
        headers.push(store.get_log_header(log).await?);
    }
    let (index_type, direction) = check_inputs(&headers)?;

    let mut accumulator = SpliceAccumulator::new(direction);
    for (position, header) in headers.iter().enumerate() {
        ctx.check_cancelled()?;

        let mnemonics = header.data_mnemonics();
        let fetched = join_all(mnemonics.iter().map(|m| {
            read_range(store, header, vec![m.clone()], None, None, config)
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        for (mnemonic, rows) in mnemonics.iter().zip(&fetched) {
            let taken = accumulator.merge_curve(mnemonic, rows.curve_values(mnemonic));
            tracing::debug!(log = %header.log, mnemonic = %mnemonic, taken, "Merged curve");
        }
        ctx.report_progress(MERGE_SHARE * (position + 1) as f64 / headers.len() as f64);
    }

    let curves = merge_curve_infos(&headers);
    let (first, last) = match (headers.first(), headers.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(CurveError::Validation("at least one log is required".to_string())),
    };
    let new_log = first.log.sibling(request.new_uid.clone());
    let mut new_header = LogHeader::new(
        new_log.clone(),
        request.new_name.clone(),
        index_type,
        direction,
        last.index_curve.clone(),
        last.index_uom.clone(),
    )
    .with_parent_names(first.well_name.clone(), first.wellbore_name.clone());
    new_header.curves = curves;

    ctx.check_cancelled()?;
    let created = &new_header;
    with_retry(config.retry_delay, "add_log", move || store.add_log(created)).await?;

    let rows = accumulator.into_row_set(CurveRowSet::for_header(&new_header, &new_header.data_mnemonics()));
    let writer = BatchWriter::open(store, new_log.clone(), config).await?;
    let written = writer
        .write_with_progress(&rows, |done, total| {
            ctx.report_progress(MERGE_SHARE + (1.0 - MERGE_SHARE) * done as f64 / total.max(1) as f64);
        })
        .await?;
    ctx.report_progress(1.0);

    tracing::info!(log = %new_log, inputs = headers.len(), rows = written, "Splice finished");
    Ok(JobOutcome::success(format!(
        "Spliced {} logs into '{}' ({} rows)",
        headers.len(),
        request.new_name,
        written
    ))
    .with_refresh(RefreshAction::added(new_log)))
}

/// All inputs must share index type and direction
fn check_inputs(headers: &[LogHeader]) -> Result<(IndexType, Direction)> {
    let first = headers
        .first()
        .ok_or_else(|| CurveError::Validation("at least one log is required".to_string()))?;

    for header in &headers[1..] {
        if header.index_type != first.index_type {
            return Err(CurveError::Validation(format!(
                "{} is indexed by {}, {} by {}",
                header.describe(),
                header.index_type,
                first.describe(),
                first.index_type
            )));
        }
        if header.direction != first.direction {
            return Err(CurveError::Precondition(format!(
                "{} is {}, {} is {}",
                header.describe(),
                header.direction,
                first.describe(),
                first.direction
            )));
        }
    }
    Ok((first.index_type, first.direction))
}
