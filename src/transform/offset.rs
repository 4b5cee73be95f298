//! Offset Transformer
//!
//! Shifts the indexes of selected curves by a constant depth or time delta.
//!
//! ## Steps
//! ```text
//!   [backup]  add <uid>-<suffix>-<millis>, copy range and its shifted image ── abort on failure
//!   per curve:
//!     read range ─▶ shift every index ─▶ delete range ─▶ write shifted
//!   [backup]  delete backup log                                    ── failure only noted
//! ```
//!
//! ## Failure After Mutation
//! - With a backup: every touched curve is restored (delete original and
//!   shifted span, copy back from the backup), then the backup is removed
//! - Without a backup: curves already shifted are reported as a partial
//!   failure

use std::cmp::Ordering;

use chrono::Utc;

use crate::batch::{read_range, with_retry, BatchWriter};
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{end_index, ensure_ordered, start_index, Delta, Direction, Index};
use crate::job::{JobContext, JobOutcome, RefreshAction};
use crate::protocol::{CurveRow, CurveRowSet};
use crate::store::{DeleteRange, LogHeader, LogRef, LogStore};

/// Parameters of an offset
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetRequest {
    pub log: LogRef,

    /// Curves to shift; empty shifts every data curve
    pub mnemonics: Vec<String>,

    /// Constant added to every index in the range
    pub offset: Delta,

    pub start: Option<String>,
    pub end: Option<String>,

    /// Copy the range to a temporary log first and restore from it on failure
    pub use_backup: bool,
}

impl OffsetRequest {
    pub fn new(log: LogRef, offset: Delta) -> Self {
        Self {
            log,
            mnemonics: Vec::new(),
            offset,
            start: None,
            end: None,
            use_backup: false,
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

    pub fn with_backup(mut self) -> Self {
        self.use_backup = true;
        self
    }
}

/// The same rows with every index shifted by `delta`
pub fn shift_rows(rows: &CurveRowSet, delta: &Delta) -> Result<CurveRowSet> {
    let shifted = rows
        .rows()
        .iter()
        .map(|row| Ok(CurveRow::new(row.index.offset(delta)?, row.values.clone())))
        .collect::<Result<Vec<_>>>()?;
    Ok(rows.with_rows(shifted))
}

/// A curve whose data has been (or is being) moved
struct TouchedCurve {
    mnemonic: String,
    /// Span covering both the original and the shifted rows, in travel order
    start: Index,
    end: Index,
}

/// Covering span of two row sets, oriented in the direction of travel
fn covering_span(a: &CurveRowSet, b: &CurveRowSet, direction: Direction) -> Result<Option<(Index, Index)>> {
    let mut bounds = a
        .first()
        .into_iter()
        .chain(a.last())
        .chain(b.first())
        .chain(b.last())
        .map(|row| &row.index);

    let first = match bounds.next() {
        Some(first) => first,
        None => return Ok(None),
    };
    let (mut low, mut high) = (first, first);
    for index in bounds {
        if index.compare(low)? == Ordering::Less {
            low = index;
        }
        if index.compare(high)? == Ordering::Greater {
            high = index;
        }
    }

    Ok(Some(if direction.is_increasing() {
        (low.clone(), high.clone())
    } else {
        (high.clone(), low.clone())
    }))
}

/// Shift the selected curves of a log
pub async fn offset_curves(
    store: &dyn LogStore,
    request: &OffsetRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<JobOutcome> {
    let header = store.get_log_header(&request.log).await?;
    let delta = &request.offset;
    if delta.index_type() != header.index_type {
        return Err(CurveError::Validation(format!(
            "a {} offset cannot be applied to a {} log",
            delta.index_type(),
            header.index_type
        )));
    }
    delta.ensure_unit(&header.index_uom)?;
    if delta.is_zero() {
        return Ok(JobOutcome::success(format!(
            "Offset is zero, nothing to shift in {}",
            header.describe()
        )));
    }

    let mnemonics = header.select_mnemonics(&request.mnemonics);
    if mnemonics.is_empty() {
        return Err(CurveError::Validation(format!(
            "none of the selected curves exist in {}",
            header.describe()
        )));
    }

    let start = start_index(&header, request.start.as_deref())?;
    let end = end_index(&header, request.end.as_deref())?;
    if let (Some(start), Some(end)) = (&start, &end) {
        ensure_ordered(start, end, header.direction)?;
    }

    let writer = BatchWriter::open(store, header.log.clone(), config).await?;
    let backup = if request.use_backup {
        let (backup_start, backup_end) = backup_bounds(&start, &end, delta, header.direction)?;
        Some(create_backup(store, &header, &mnemonics, &backup_start, &backup_end, config).await?)
    } else {
        None
    };

    let steps = (mnemonics.len() * 2) as f64;
    let mut shifted: Vec<String> = Vec::new();
    let mut touched: Vec<TouchedCurve> = Vec::new();

    for (position, mnemonic) in mnemonics.iter().enumerate() {
        let step = async {
            ctx.check_cancelled()?;
            let rows = read_range(store, &header, vec![mnemonic.clone()], start.clone(), end.clone(), config).await?;
            if rows.is_empty() {
                return Ok(());
            }
            let moved = shift_rows(&rows, delta)?;
            if let Some((span_start, span_end)) = covering_span(&rows, &moved, header.direction)? {
                touched.push(TouchedCurve {
                    mnemonic: mnemonic.clone(),
                    start: span_start,
                    end: span_end,
                });
            }

            writer
                .delete(&DeleteRange::new(vec![mnemonic.clone()], start.clone(), end.clone()))
                .await?;
            ctx.report_progress((position * 2 + 1) as f64 / steps);

            writer.write(&moved).await?;
            tracing::debug!(log = %header.log, mnemonic = %mnemonic, rows = moved.len(), "Shifted curve");
            Ok::<(), CurveError>(())
        };

        if let Err(e) = step.await {
            tracing::error!(log = %header.log, mnemonic = %mnemonic, error = %e, "Offset failed");
            let outcome = match &backup {
                Some(backup) => roll_back(store, &writer, backup, &touched, mnemonic, &e, config).await,
                None if shifted.is_empty() => {
                    JobOutcome::failure(format!("Offset failed on curve '{}': {}", mnemonic, e))
                }
                None => JobOutcome::partial(format!(
                    "Shifted curves {}; offset failed on curve '{}': {}",
                    shifted.join(", "),
                    mnemonic,
                    e
                ))
                .with_refresh(RefreshAction::updated(header.log.clone())),
            };
            return Ok(outcome.with_entity(header.describe()));
        }

        shifted.push(mnemonic.clone());
        ctx.report_progress((position * 2 + 2) as f64 / steps);
    }

    let mut message = format!(
        "Shifted {} curves of {} by {}",
        shifted.len(),
        header.describe(),
        delta
    );
    if let Some(backup) = &backup {
        let log = &backup.log;
        if let Err(e) = with_retry(config.retry_delay, "delete_log", move || store.delete_log(log)).await {
            tracing::warn!(backup = %backup.log, error = %e, "Could not delete backup log");
            message.push_str(&format!("; backup log '{}' could not be deleted: {}", backup.log.uid, e));
        }
    }

    tracing::info!(log = %header.log, curves = shifted.len(), offset = %delta, "Offset finished");
    Ok(JobOutcome::success(message).with_refresh(RefreshAction::updated(header.log.clone())))
}

/// Range the backup must hold: the selected range and where it lands once shifted
///
/// Shifted rows may merge into data outside the selection, and a restore
/// deletes that area too.
fn backup_bounds(
    start: &Option<Index>,
    end: &Option<Index>,
    delta: &Delta,
    direction: Direction,
) -> Result<(Option<Index>, Option<Index>)> {
    let pick = |index: &Option<Index>, keep: Ordering| -> Result<Option<Index>> {
        match index {
            Some(index) => {
                let shifted = index.offset(delta)?;
                Ok(Some(if direction.order(&shifted, index)? == keep {
                    shifted
                } else {
                    index.clone()
                }))
            }
            None => Ok(None),
        }
    };
    Ok((pick(start, Ordering::Less)?, pick(end, Ordering::Greater)?))
}

/// Create the backup log and copy the given range into it
///
/// On failure a partially created backup is removed and nothing else has
/// been touched.
async fn create_backup(
    store: &dyn LogStore,
    header: &LogHeader,
    mnemonics: &[String],
    start: &Option<Index>,
    end: &Option<Index>,
    config: &Config,
) -> Result<LogHeader> {
    let uid = format!(
        "{}-{}-{}",
        header.log.uid,
        config.backup_suffix,
        Utc::now().timestamp_millis()
    );
    let mut backup = LogHeader::new(
        header.log.sibling(uid),
        format!("{} ({})", header.name, config.backup_suffix),
        header.index_type,
        header.direction,
        header.index_curve.clone(),
        header.index_uom.clone(),
    )
    .with_parent_names(header.well_name.clone(), header.wellbore_name.clone());
    for mnemonic in mnemonics {
        let unit = header.curve(mnemonic).map(|c| c.unit.clone()).unwrap_or_default();
        backup = backup.with_curve(mnemonic.clone(), unit);
    }

    let created = &backup;
    with_retry(config.retry_delay, "add_log", move || store.add_log(created)).await?;

    let copy = async {
        let writer = BatchWriter::open(store, backup.log.clone(), config).await?;
        for mnemonic in mnemonics {
            let rows = read_range(store, header, vec![mnemonic.clone()], start.clone(), end.clone(), config).await?;
            writer.write(&rows).await?;
        }
        Ok::<(), CurveError>(())
    };

    if let Err(e) = copy.await {
        if let Err(cleanup) = store.delete_log(&backup.log).await {
            tracing::warn!(backup = %backup.log, error = %cleanup, "Could not remove partial backup");
        }
        return Err(e);
    }

    tracing::debug!(backup = %backup.log, curves = mnemonics.len(), "Created backup log");
    Ok(backup)
}

/// Put every touched curve back the way the backup has it
async fn restore(
    store: &dyn LogStore,
    writer: &BatchWriter<'_>,
    backup: &LogHeader,
    touched: &[TouchedCurve],
    config: &Config,
) -> Result<()> {
    for curve in touched {
        writer
            .delete(&DeleteRange::new(
                vec![curve.mnemonic.clone()],
                Some(curve.start.clone()),
                Some(curve.end.clone()),
            ))
            .await?;
        let rows = read_range(store, backup, vec![curve.mnemonic.clone()], None, None, config).await?;
        writer.write(&rows).await?;
    }
    Ok(())
}

async fn roll_back(
    store: &dyn LogStore,
    writer: &BatchWriter<'_>,
    backup: &LogHeader,
    touched: &[TouchedCurve],
    failed: &str,
    error: &CurveError,
    config: &Config,
) -> JobOutcome {
    if let Err(e) = restore(store, writer, backup, touched, config).await {
        tracing::error!(backup = %backup.log, error = %e, "Restore from backup failed");
        return JobOutcome::failure(format!(
            "Offset failed on curve '{}': {}; restoring from backup log '{}' failed: {}",
            failed, error, backup.log.uid, e
        ));
    }

    let mut message = format!(
        "Offset failed on curve '{}': {}; {} curves restored from backup",
        failed,
        error,
        touched.len()
    );
    let log = &backup.log;
    if let Err(e) = with_retry(config.retry_delay, "delete_log", move || store.delete_log(log)).await {
        tracing::warn!(backup = %backup.log, error = %e, "Could not delete backup log");
        message.push_str(&format!("; backup log '{}' could not be deleted", backup.log.uid));
    }
    JobOutcome::failure(message)
}
