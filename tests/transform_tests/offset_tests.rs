//! Offset tests
//!
//! These tests verify:
//! - Shifting whole curves and sub-ranges
//! - A shift followed by its negation restores the log
//! - Partial failure without a backup, rollback with one
//! - Input validation

#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::TimeDelta;
use wellcurve::job::RefreshAction;
use wellcurve::protocol::CurveBatch;
use wellcurve::store::{
    DataQuery, DeleteRange, Fault, InMemoryStore, LogHeader, LogRef, LogStore, ObjectSummary,
    StoreCapabilities, StoreOp, WellboreRef,
};
use wellcurve::transform::{offset_curves, OffsetRequest};
use wellcurve::{Config, CurveError, Delta, JobContext, OutcomeStatus, Result};

use common::{curve_points, depth_delta, depth_log, log_ref, test_config, time_log};

fn points(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(i, v)| (i.to_string(), v.to_string()))
        .collect()
}

/// Rejects the first write of `mnemonic` to log `log`; everything else goes to `inner`
struct FailOnceStore {
    inner: InMemoryStore,
    mnemonic: &'static str,
    armed: AtomicBool,
}

impl FailOnceStore {
    fn new(inner: InMemoryStore, mnemonic: &'static str) -> Self {
        Self {
            inner,
            mnemonic,
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl LogStore for FailOnceStore {
    async fn get_log_header(&self, log: &LogRef) -> Result<LogHeader> {
        self.inner.get_log_header(log).await
    }

    async fn get_log_data(&self, query: &DataQuery) -> Result<CurveBatch> {
        self.inner.get_log_data(query).await
    }

    async fn add_log(&self, header: &LogHeader) -> Result<()> {
        self.inner.add_log(header).await
    }

    async fn update_log_data(&self, log: &LogRef, data: &CurveBatch) -> Result<()> {
        let targeted = log.uid == "log" && data.mnemonics.iter().any(|m| m == self.mnemonic);
        if targeted && self.armed.swap(false, Ordering::SeqCst) {
            return Err(CurveError::Store(format!("{} is read-only", self.mnemonic)));
        }
        self.inner.update_log_data(log, data).await
    }

    async fn delete_log_data(&self, log: &LogRef, range: &DeleteRange) -> Result<()> {
        self.inner.delete_log_data(log, range).await
    }

    async fn delete_log(&self, log: &LogRef) -> Result<()> {
        self.inner.delete_log(log).await
    }

    async fn capabilities(&self) -> Result<StoreCapabilities> {
        self.inner.capabilities().await
    }

    async fn list_wellbore_objects(&self, wellbore: &WellboreRef) -> Result<Vec<ObjectSummary>> {
        self.inner.list_wellbore_objects(wellbore).await
    }
}

const ROWS: [&str; 5] = ["1,g1,r1", "2,g2,r2", "3,g3,r3", "4,g4,r4", "5,g5,r5"];

// =============================================================================
// Shift Tests
// =============================================================================

#[tokio::test]
async fn test_shift_whole_log() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &ROWS);

    let request = OffsetRequest::new(log_ref("log"), depth_delta("0.5"));
    let outcome = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(outcome.refresh, Some(RefreshAction::updated(log_ref("log"))));
    assert_eq!(
        curve_points(&store, "log", "GR"),
        points(&[("1.5", "g1"), ("2.5", "g2"), ("3.5", "g3"), ("4.5", "g4"), ("5.5", "g5")])
    );
}

#[tokio::test]
async fn test_shift_selected_range_and_curve() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &ROWS);

    let request = OffsetRequest::new(log_ref("log"), depth_delta("10"))
        .mnemonics(vec!["GR".to_string()])
        .range(Some("2".to_string()), Some("3".to_string()));
    offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert_eq!(
        curve_points(&store, "log", "GR"),
        points(&[("1", "g1"), ("4", "g4"), ("5", "g5"), ("12", "g2"), ("13", "g3")])
    );
    assert_eq!(curve_points(&store, "log", "ROP").len(), 5);
}

#[tokio::test]
async fn test_shift_and_negate_restores_log() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &ROWS);
    let original = store.log_data(&log_ref("log")).unwrap();
    let ctx = JobContext::new();

    let forward = OffsetRequest::new(log_ref("log"), depth_delta("2.25"));
    offset_curves(&store, &forward, &test_config(), &ctx).await.unwrap();
    let back = OffsetRequest::new(log_ref("log"), -depth_delta("2.25"));
    offset_curves(&store, &back, &test_config(), &ctx).await.unwrap();

    let restored = store.log_data(&log_ref("log")).unwrap();
    let keys = |rows: &wellcurve::protocol::CurveRowSet| {
        rows.rows()
            .iter()
            .map(|r| (r.index.key(), r.values.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&restored), keys(&original));
}

#[tokio::test]
async fn test_shift_time_log() {
    let store = InMemoryStore::new();
    time_log(&store, "log", &["GR"], &["2024-03-01T10:00:00Z,1", "2024-03-01T11:00:00Z,2"]);

    let request = OffsetRequest::new(log_ref("log"), Delta::time(TimeDelta::minutes(30)));
    offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert_eq!(
        curve_points(&store, "log", "GR"),
        points(&[("2024-03-01T10:30:00Z", "1"), ("2024-03-01T11:30:00Z", "2")])
    );
}

#[tokio::test]
async fn test_shift_keeps_closely_spaced_rows() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1.0000001,1", "1.0000005,2", "1.0000009,3"]);
    time_log(
        &store,
        "timed",
        &["GR"],
        &[
            "2024-01-01T00:00:00.0001Z,1",
            "2024-01-01T00:00:00.0005Z,2",
            "2024-01-01T00:00:00.0009Z,3",
        ],
    );
    let config = Config::builder().max_rows_per_request(1).build();
    let ctx = JobContext::new();

    let request = OffsetRequest::new(log_ref("log"), depth_delta("10"));
    let outcome = offset_curves(&store, &request, &config, &ctx).await.unwrap();
    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(
        curve_points(&store, "log", "GR"),
        points(&[("11.0000001", "1"), ("11.0000005", "2"), ("11.0000009", "3")])
    );

    let request = OffsetRequest::new(log_ref("timed"), Delta::time(TimeDelta::seconds(1)));
    let outcome = offset_curves(&store, &request, &config, &ctx).await.unwrap();
    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(
        curve_points(&store, "timed", "GR"),
        points(&[
            ("2024-01-01T00:00:01.000100Z", "1"),
            ("2024-01-01T00:00:01.000500Z", "2"),
            ("2024-01-01T00:00:01.000900Z", "3"),
        ])
    );
}

#[tokio::test]
async fn test_zero_offset_touches_nothing() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1"]);

    let request = OffsetRequest::new(log_ref("log"), depth_delta("0"));
    let outcome = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(store.call_count(StoreOp::DeleteData), 0);
    assert_eq!(store.call_count(StoreOp::UpdateData), 0);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[tokio::test]
async fn test_time_offset_on_depth_log_is_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1"]);

    let request = OffsetRequest::new(log_ref("log"), Delta::time(TimeDelta::minutes(1)));
    let err = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Validation(_)));
}

#[tokio::test]
async fn test_offset_in_other_unit_is_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1"]);

    let request = OffsetRequest::new(log_ref("log"), Delta::depth(rust_decimal::Decimal::ONE, "ft"));
    let err = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CurveError::Validation(_)));
    assert_eq!(store.call_count(StoreOp::DeleteData), 0);
    assert_eq!(curve_points(&store, "log", "GR"), points(&[("1", "1")]));
}

#[tokio::test]
async fn test_unknown_curves_are_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1"]);

    let request = OffsetRequest::new(log_ref("log"), depth_delta("1")).mnemonics(vec!["BOGUS".to_string()]);
    let err = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Validation(_)));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_failure_on_first_curve_without_backup() {
    let inner = InMemoryStore::new();
    depth_log(&inner, "log", &["GR", "ROP"], &ROWS);
    let store = FailOnceStore::new(inner, "GR");

    let outcome = offset_curves(
        &store,
        &OffsetRequest::new(log_ref("log"), depth_delta("1")),
        &test_config(),
        &JobContext::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(outcome.entity.is_some());
    assert!(outcome.refresh.is_none());
}

#[tokio::test]
async fn test_failure_after_first_curve_is_partial() {
    let inner = InMemoryStore::new();
    depth_log(&inner, "log", &["GR", "ROP"], &ROWS);
    let store = FailOnceStore::new(inner, "ROP");

    let outcome = offset_curves(
        &store,
        &OffsetRequest::new(log_ref("log"), depth_delta("1")),
        &test_config(),
        &JobContext::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::PartiallySucceeded);
    assert!(outcome.message.contains("GR"), "{}", outcome.message);
    assert_eq!(outcome.refresh, Some(RefreshAction::updated(log_ref("log"))));
    assert_eq!(curve_points(&store.inner, "log", "GR")[0], ("2".to_string(), "g1".to_string()));
}

#[tokio::test]
async fn test_failure_with_backup_restores_log() {
    let inner = InMemoryStore::new();
    depth_log(&inner, "log", &["GR", "ROP"], &ROWS);
    let original = inner.log_data(&log_ref("log")).unwrap();
    let store = FailOnceStore::new(inner, "ROP");

    // GR rows 1..2 land on 3..4 and overwrite g3 and g4 before ROP fails
    let request = OffsetRequest::new(log_ref("log"), depth_delta("2"))
        .range(Some("1".to_string()), Some("2".to_string()))
        .with_backup();
    let outcome = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert!(outcome.message.contains("restored"), "{}", outcome.message);
    assert_eq!(store.inner.log_data(&log_ref("log")).unwrap().rows(), original.rows());
    assert_eq!(store.inner.log_refs(), vec![log_ref("log")]);
}

#[tokio::test]
async fn test_backup_is_removed_after_success() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1", "2,2"]);

    let request = OffsetRequest::new(log_ref("log"), depth_delta("1")).with_backup();
    let outcome = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert!(outcome.is_success(), "{}", outcome.message);
    assert_eq!(store.call_count(StoreOp::AddLog), 1);
    assert_eq!(store.call_count(StoreOp::DeleteLog), 1);
    assert_eq!(store.log_refs(), vec![log_ref("log")]);
}

#[tokio::test]
async fn test_backup_creation_failure_aborts_before_changes() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,1", "2,2"]);
    store.inject_fault(StoreOp::AddLog, Fault::Rejected("quota".to_string()));

    let request = OffsetRequest::new(log_ref("log"), depth_delta("1")).with_backup();
    let err = offset_curves(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CurveError::Store(_)));
    assert_eq!(store.call_count(StoreOp::DeleteData), 0);
    assert_eq!(curve_points(&store, "log", "GR"), points(&[("1", "1"), ("2", "2")]));
}
