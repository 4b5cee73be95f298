//! Engine Module
//!
//! Dispatches jobs to the curve algorithms.
//!
//! ## Responsibilities
//! - Route each job to its algorithm with the right store(s)
//! - Turn every algorithm failure into a `Failed` outcome carrying the
//!   entity the job was about; nothing escapes `execute` as an error
//! - Log job start and finish

use std::fmt;
use std::sync::Arc;

use crate::analysis::{self, ConsistencyRequest, GapRequest, QcRequest};
use crate::compare::{self, CompareRequest, WellboreCompareRequest};
use crate::config::Config;
use crate::error::Result;
use crate::job::{JobContext, JobOutcome};
use crate::report::Report;
use crate::store::LogStore;
use crate::transform::{self, OffsetRequest, SpliceRequest, TrimRequest};

/// A unit of work for the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Gaps(GapRequest),
    Qc(QcRequest),
    Consistency(ConsistencyRequest),
    CompareLogData(CompareRequest),
    CompareWellbores(WellboreCompareRequest),
    Splice(SpliceRequest),
    Offset(OffsetRequest),
    Trim(TrimRequest),
}

impl Job {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Job::Gaps(_) => "gaps",
            Job::Qc(_) => "qc",
            Job::Consistency(_) => "consistency",
            Job::CompareLogData(_) => "compare_log_data",
            Job::CompareWellbores(_) => "compare_wellbores",
            Job::Splice(_) => "splice",
            Job::Offset(_) => "offset",
            Job::Trim(_) => "trim",
        }
    }

    /// Identity of the object the job works on, for user display
    pub fn entity(&self) -> String {
        match self {
            Job::Gaps(r) => r.log.to_string(),
            Job::Qc(r) => r.log.to_string(),
            Job::Consistency(r) => r.log.to_string(),
            Job::CompareLogData(r) => format!("{} against {}", r.source, r.target),
            Job::CompareWellbores(r) => format!("{} against {}", r.source, r.target),
            Job::Splice(r) => r
                .logs
                .iter()
                .map(|log| log.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            Job::Offset(r) => r.log.to_string(),
            Job::Trim(r) => r.log.to_string(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.entity())
    }
}

/// Runs jobs against a source store and, for comparisons, a target store
///
/// The target defaults to the source, so comparisons on one store need no
/// extra setup.
pub struct Engine {
    config: Config,
    source: Arc<dyn LogStore>,
    target: Arc<dyn LogStore>,
}

impl Engine {
    /// Create an engine working on one store
    pub fn new(config: Config, store: Arc<dyn LogStore>) -> Self {
        Self {
            config,
            target: Arc::clone(&store),
            source: store,
        }
    }

    /// Compare against a different store
    pub fn with_target(mut self, target: Arc<dyn LogStore>) -> Self {
        self.target = target;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run a job to completion
    ///
    /// Never fails: errors become `Failed` outcomes.
    pub async fn execute(&self, job: Job, ctx: &JobContext) -> JobOutcome {
        tracing::info!(job = job.name(), entity = %job.entity(), "Job started");

        match self.dispatch(&job, ctx).await {
            Ok(outcome) => {
                tracing::info!(
                    job = job.name(),
                    status = ?outcome.status,
                    "Job finished"
                );
                outcome
            }
            Err(e) => {
                tracing::error!(job = job.name(), entity = %job.entity(), error = %e, "Job failed");
                JobOutcome::failure(e.to_string()).with_entity(job.entity())
            }
        }
    }

    async fn dispatch(&self, job: &Job, ctx: &JobContext) -> Result<JobOutcome> {
        let config = &self.config;
        let source = self.source.as_ref();
        let target = self.target.as_ref();

        match job {
            Job::Gaps(request) => {
                report_outcome(analysis::analyze_gaps(source, request, config, ctx).await?)
            }
            Job::Qc(request) => {
                report_outcome(analysis::minimum_data_qc(source, request, config, ctx).await?)
            }
            Job::Consistency(request) => {
                report_outcome(analysis::check_header(source, request, ctx).await?)
            }
            Job::CompareLogData(request) => report_outcome(
                compare::compare_log_data(source, target, request, config, ctx).await?,
            ),
            Job::CompareWellbores(request) => report_outcome(
                compare::compare_wellbores(source, target, request, config, ctx).await?,
            ),
            Job::Splice(request) => transform::splice_logs(source, request, config, ctx).await,
            Job::Offset(request) => transform::offset_curves(source, request, config, ctx).await,
            Job::Trim(request) => transform::trim_log(source, request, config, ctx).await,
        }
    }
}

fn report_outcome(report: Report) -> Result<JobOutcome> {
    Ok(JobOutcome::success(report.summary.clone()).with_report(report))
}
