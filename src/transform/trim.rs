//! Trimmer
//!
//! Shrinks the valid range of a log by deleting data before a new start
//! and after a new end.
//!
//! ```text
//!   current:     start ─────────────────────────────── end
//!   requested:            new_start ──────── new_end
//!   deleted:     [start, new_start)          (new_end, end]
//! ```
//! A side is trimmed only when its new boundary lies strictly inside the
//! current range. Decreasing logs are not supported.

use std::cmp::Ordering;

use crate::batch::BatchWriter;
use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{end_index, start_index, Direction, Index};
use crate::job::{JobContext, JobOutcome, RefreshAction};
use crate::store::{DeleteRange, LogRef, LogStore};

/// Parameters of a trim; a missing boundary keeps the current one
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub log: LogRef,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TrimRequest {
    pub fn new(log: LogRef, start: Option<String>, end: Option<String>) -> Self {
        Self { log, start, end }
    }
}

/// Deletes a trim will issue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrimPlan {
    /// Everything before the new start
    pub start: Option<DeleteRange>,
    /// Everything after the new end
    pub end: Option<DeleteRange>,
}

impl TrimPlan {
    pub fn is_noop(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Work out which sides to trim
pub fn plan_trim(
    current_start: &Index,
    current_end: &Index,
    new_start: &Index,
    new_end: &Index,
    direction: Direction,
) -> Result<TrimPlan> {
    if direction.order(new_start, new_end)? == Ordering::Greater {
        return Err(CurveError::Validation(format!(
            "new start {} is past new end {}",
            new_start, new_end
        )));
    }

    let strictly_inside = |index: &Index| -> Result<bool> {
        Ok(direction.order(index, current_start)? == Ordering::Greater
            && direction.order(index, current_end)? == Ordering::Less)
    };

    let mut plan = TrimPlan::default();
    if strictly_inside(new_start)? {
        let last_deleted = new_start.epsilon_advance(direction.reversed());
        plan.start = Some(DeleteRange::new(Vec::new(), None, Some(last_deleted)));
    }
    if strictly_inside(new_end)? {
        let first_deleted = new_end.epsilon_advance(direction);
        plan.end = Some(DeleteRange::new(Vec::new(), Some(first_deleted), None));
    }
    Ok(plan)
}

/// Trim a log to a new start and/or end
pub async fn trim_log(
    store: &dyn LogStore,
    request: &TrimRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<JobOutcome> {
    let header = store.get_log_header(&request.log).await?;
    if !header.direction.is_increasing() {
        return Err(CurveError::Precondition(format!(
            "trimming decreasing logs is not supported ({})",
            header.describe()
        )));
    }

    let (current_start, current_end) = match (&header.start_index, &header.end_index) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Ok(JobOutcome::success(format!(
                "{} has no data, nothing to trim",
                header.describe()
            )))
        }
    };

    let new_start = start_index(&header, request.start.as_deref())?.unwrap_or_else(|| current_start.clone());
    let new_end = end_index(&header, request.end.as_deref())?.unwrap_or_else(|| current_end.clone());

    let plan = plan_trim(current_start, current_end, &new_start, &new_end, header.direction)?;
    if plan.is_noop() {
        return Ok(JobOutcome::success(format!(
            "{} already lies within {} and {}",
            header.describe(),
            new_start,
            new_end
        )));
    }

    ctx.check_cancelled()?;
    let writer = BatchWriter::open(store, header.log.clone(), config).await?;

    let mut trimmed = Vec::new();
    let mut failed = Vec::new();
    let sides = [("start", &plan.start, &new_start), ("end", &plan.end, &new_end)];
    for (side, range, boundary) in sides {
        let range = match range {
            Some(range) => range,
            None => continue,
        };
        match writer.delete(range).await {
            Ok(()) => {
                tracing::debug!(log = %header.log, side, boundary = %boundary, "Trimmed");
                trimmed.push(format!("{} to {}", side, boundary));
            }
            Err(e) => {
                tracing::error!(log = %header.log, side, error = %e, "Trim failed");
                failed.push(format!("{} ({})", side, e));
            }
        }
    }
    ctx.report_progress(1.0);

    let refresh = RefreshAction::updated(header.log.clone());
    let outcome = match (trimmed.is_empty(), failed.is_empty()) {
        (false, true) => JobOutcome::success(format!(
            "Trimmed {}: {}",
            header.describe(),
            trimmed.join(", ")
        ))
        .with_refresh(refresh),
        (false, false) => JobOutcome::partial(format!(
            "Trimmed {}: {}; failed to trim {}",
            header.describe(),
            trimmed.join(", "),
            failed.join(", ")
        ))
        .with_refresh(refresh),
        _ => JobOutcome::failure(format!("Failed to trim {}", failed.join(", ")))
            .with_entity(header.describe()),
    };
    tracing::info!(log = %header.log, status = ?outcome.status, "Trim finished");
    Ok(outcome)
}
