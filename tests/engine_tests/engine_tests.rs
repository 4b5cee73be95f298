//! Engine Tests
//!
//! Tests for job dispatch, outcome construction and failure handling.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use wellcurve::analysis::{ConsistencyRequest, GapRequest, QcRequest};
use wellcurve::compare::{CompareRequest, WellboreCompareRequest};
use wellcurve::job::RefreshKind;
use wellcurve::store::{Fault, InMemoryStore, StoreOp};
use wellcurve::transform::{OffsetRequest, SpliceRequest, TrimRequest};
use wellcurve::{Engine, Job, JobContext, OutcomeStatus};

use common::{curve_points, dec, depth_delta, depth_log, log_ref, test_config};

fn engine(store: &Arc<InMemoryStore>) -> Engine {
    Engine::new(test_config(), store.clone())
}

fn gapped_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    depth_log(
        &store,
        "log",
        &["GR", "ROP"],
        &["0,1,1", "1,1,1", "2,1,1", "3,,1", "7,,1", "8,1,1"],
    );
    store
}

// =============================================================================
// Report Job Tests
// =============================================================================

#[tokio::test]
async fn test_gap_job_returns_report() {
    let store = gapped_store();

    let job = Job::Gaps(GapRequest::new(log_ref("log"), depth_delta("5")));
    let outcome = engine(&store).execute(job, &JobContext::new()).await;

    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    let report = outcome.report.as_ref().unwrap();
    assert_eq!(report.gaps().count(), 1);
    assert_eq!(outcome.message, report.summary);
}

#[tokio::test]
async fn test_qc_and_consistency_jobs() {
    let store = gapped_store();
    let engine = engine(&store);
    let ctx = JobContext::new();

    let qc = QcRequest::new(log_ref("log"), vec!["GR".to_string(), "TEMP".to_string()])
        .density(dec("0.1"))
        .depth_gap(dec("5"));
    let outcome = engine.execute(Job::Qc(qc), &ctx).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.report.unwrap().len(), 2);

    let outcome = engine
        .execute(Job::Consistency(ConsistencyRequest::new(log_ref("log"))), &ctx)
        .await;
    assert!(outcome.is_success());
    assert!(outcome.report.unwrap().is_empty());
}

#[tokio::test]
async fn test_comparisons_use_target_store() {
    let source = gapped_store();
    let target = Arc::new(InMemoryStore::new());
    depth_log(&target, "log", &["GR", "ROP"], &["0,1,1", "8,2,1"]);

    let engine = Engine::new(test_config(), source.clone()).with_target(target.clone());
    let ctx = JobContext::new();

    let outcome = engine
        .execute(Job::CompareLogData(CompareRequest::new(log_ref("log"), log_ref("log"))), &ctx)
        .await;
    assert!(outcome.is_success(), "{}", outcome.message);
    // GR at 1, 2 and 8; ROP at 1, 2, 3 and 7
    assert_eq!(outcome.report.unwrap().len(), 7);

    let wellbore = log_ref("log").wellbore();
    let outcome = engine
        .execute(
            Job::CompareWellbores(WellboreCompareRequest::new(wellbore.clone(), wellbore)),
            &ctx,
        )
        .await;
    assert!(outcome.is_success());
    assert!(outcome.report.unwrap().is_empty());
}

// =============================================================================
// Transform Job Tests
// =============================================================================

#[tokio::test]
async fn test_transform_jobs_mutate_store() {
    let store = gapped_store();
    let engine = engine(&store);
    let ctx = JobContext::new();

    let splice = SpliceRequest::new(vec![log_ref("log")], "copy", "Copy");
    let outcome = engine.execute(Job::Splice(splice), &ctx).await;
    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(outcome.refresh.as_ref().unwrap().kind, RefreshKind::Add);

    let offset = OffsetRequest::new(log_ref("copy"), depth_delta("1"));
    let outcome = engine.execute(Job::Offset(offset), &ctx).await;
    assert!(outcome.is_success(), "{}", outcome.message);

    let trim = TrimRequest::new(log_ref("copy"), Some("2".to_string()), None);
    let outcome = engine.execute(Job::Trim(trim), &ctx).await;
    assert!(outcome.is_success(), "{}", outcome.message);

    let gr: Vec<_> = curve_points(&store, "copy", "GR").into_iter().map(|(i, _)| i).collect();
    assert_eq!(gr, vec!["2", "3", "9"]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_errors_become_failed_outcomes() {
    let store = Arc::new(InMemoryStore::new());

    let job = Job::Gaps(GapRequest::new(log_ref("missing"), depth_delta("5")));
    let entity = job.entity();
    let outcome = engine(&store).execute(job, &JobContext::new()).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.entity, Some(entity));
    assert!(outcome.report.is_none());
    assert!(outcome.message.contains("not found"), "{}", outcome.message);
}

#[tokio::test]
async fn test_store_failure_becomes_failed_outcome() {
    let store = gapped_store();
    store.inject_fault(StoreOp::GetData, Fault::Communication);

    let job = Job::Consistency(ConsistencyRequest::new(log_ref("log")));
    let outcome = engine(&store).execute(job, &JobContext::new()).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(outcome.entity.unwrap().contains("log log"));
}

#[tokio::test]
async fn test_cancelled_job_fails() {
    let store = gapped_store();
    let ctx = JobContext::new();
    ctx.cancellation_token().cancel();

    let job = Job::Gaps(GapRequest::new(log_ref("log"), depth_delta("5")));
    let outcome = engine(&store).execute(job, &ctx).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.message, "Job cancelled");
}

// =============================================================================
// Job Description Tests
// =============================================================================

#[test]
fn test_job_names_and_display() {
    let job = Job::Trim(TrimRequest::new(log_ref("log"), None, None));
    assert_eq!(job.name(), "trim");
    assert_eq!(job.to_string(), "trim (well well-1, wellbore wellbore-1, log log)");

    let splice = Job::Splice(SpliceRequest::new(vec![log_ref("a"), log_ref("b")], "c", "C"));
    assert_eq!(
        splice.entity(),
        "well well-1, wellbore wellbore-1, log a; well well-1, wellbore wellbore-1, log b"
    );
}

#[tokio::test]
async fn test_outcome_serializes_to_json() {
    let store = gapped_store();
    let job = Job::Gaps(GapRequest::new(log_ref("log"), depth_delta("5")));
    let outcome = engine(&store).execute(job, &JobContext::new()).await;

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "succeeded");
    assert_eq!(json["report"]["items"][0]["kind"], "gap");
    assert_eq!(json["report"]["items"][0]["size"], "6 m");
    assert!(json.get("entity").is_none());
}
