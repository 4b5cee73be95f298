//! Job interface
//!
//! What every algorithm receives (a [`JobContext`]) and what it hands back
//! to the caller (a [`JobOutcome`]).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{CurveError, Result};
use crate::report::Report;
use crate::store::LogRef;

// =============================================================================
// Context
// =============================================================================

/// Progress callback receiving a fraction in `0.0..=1.0`
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Progress reporting and cancellation for one running job
#[derive(Clone, Default)]
pub struct JobContext {
    progress: Option<ProgressFn>,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Report progress, clamped to `0.0..=1.0`
    pub fn report_progress(&self, fraction: f64) {
        if let Some(progress) = &self.progress {
            let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
            progress(fraction);
        }
    }

    /// Fail with `Cancelled` once the token has fired
    ///
    /// Algorithms call this between logical steps only.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CurveError::Cancelled);
        }
        Ok(())
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("progress", &self.progress.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    /// Some steps succeeded and some failed; the message lists both
    PartiallySucceeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshKind {
    Add,
    Update,
}

/// Which entity a client should reload after the job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshAction {
    pub kind: RefreshKind,
    pub log: LogRef,
}

impl RefreshAction {
    pub fn added(log: LogRef) -> Self {
        Self {
            kind: RefreshKind::Add,
            log,
        }
    }

    pub fn updated(log: LogRef) -> Self {
        Self {
            kind: RefreshKind::Update,
            log,
        }
    }
}

/// Result of a job as handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutcome {
    pub status: OutcomeStatus,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshAction>,

    /// Description of the object the job worked on, for user display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl JobOutcome {
    fn new(status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            report: None,
            refresh: None,
            entity: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Succeeded, message)
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::PartiallySucceeded, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Failed, message)
    }

    pub fn with_report(mut self, report: Report) -> Self {
        self.report = Some(report);
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshAction) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}
