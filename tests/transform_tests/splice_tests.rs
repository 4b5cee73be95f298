//! Splice tests
//!
//! These tests verify:
//! - Earlier logs win inside their coverage, later logs extend it
//! - Curve definitions are merged across inputs
//! - Splicing is idempotent
//! - Input validation and preconditions

#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Mutex};

use wellcurve::job::{RefreshAction, RefreshKind};
use wellcurve::store::{Fault, InMemoryStore, StoreOp};
use wellcurve::transform::{merge_curve_infos, splice_logs, SpliceAccumulator, SpliceRequest};
use wellcurve::{CurveError, Direction, IndexType, JobContext, OutcomeStatus};

use common::{curve_points, depth, depth_log, load_log, log_ref, test_config, time_log};

fn points(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(i, v)| (i.to_string(), v.to_string()))
        .collect()
}

fn request(uids: &[&str]) -> SpliceRequest {
    SpliceRequest::new(uids.iter().map(|u| log_ref(u)).collect(), "spliced", "Spliced")
}

// =============================================================================
// Merge Tests
// =============================================================================

#[tokio::test]
async fn test_later_logs_only_extend_coverage() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["100,a1", "150,a2", "200,a3"]);
    depth_log(&store, "b", &["GR"], &["50,b1", "150,b2", "180,b3", "260,b4"]);

    let outcome = splice_logs(&store, &request(&["a", "b"]), &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.refresh, Some(RefreshAction::added(log_ref("spliced"))));
    assert_eq!(
        curve_points(&store, "spliced", "GR"),
        points(&[("50", "b1"), ("100", "a1"), ("150", "a2"), ("200", "a3"), ("260", "b4")])
    );
}

#[tokio::test]
async fn test_curves_are_merged_independently() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,g1", "2,g2"]);
    depth_log(&store, "b", &["GR", "ROP"], &["2,x,r2", "3,g3,r3"]);

    splice_logs(&store, &request(&["a", "b"]), &test_config(), &JobContext::new())
        .await
        .unwrap();

    let header = store.header(&log_ref("spliced")).unwrap();
    assert_eq!(header.index_curve, "DEPTH");
    assert_eq!(header.data_mnemonics(), vec!["GR", "ROP"]);
    assert_eq!(header.name, "Spliced");
    assert_eq!(
        curve_points(&store, "spliced", "GR"),
        points(&[("1", "g1"), ("2", "g2"), ("3", "g3")])
    );
    assert_eq!(curve_points(&store, "spliced", "ROP"), points(&[("2", "r2"), ("3", "r3")]));
}

#[tokio::test]
async fn test_decreasing_logs() {
    let store = InMemoryStore::new();
    for (uid, rows) in [("a", ["20,a1", "10,a2"]), ("b", ["30,b1", "15,b2"])] {
        load_log(&store, uid, IndexType::Depth, Direction::Decreasing, &["GR"], &rows);
    }

    splice_logs(&store, &request(&["a", "b"]), &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert_eq!(
        curve_points(&store, "spliced", "GR"),
        points(&[("30", "b1"), ("20", "a1"), ("10", "a2")])
    );
    let header = store.header(&log_ref("spliced")).unwrap();
    assert_eq!(header.start_index, Some(depth("30")));
}

#[tokio::test]
async fn test_splice_is_idempotent() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR", "ROP"], &["1,10,", "2,11,21", "3,,22"]);

    let ctx = JobContext::new();
    splice_logs(&store, &request(&["a"]), &test_config(), &ctx).await.unwrap();
    let twice = SpliceRequest::new(vec![log_ref("a"), log_ref("a")], "twice", "Twice");
    splice_logs(&store, &twice, &test_config(), &ctx).await.unwrap();

    let original = store.log_data(&log_ref("a")).unwrap();
    let once = store.log_data(&log_ref("spliced")).unwrap();
    let twice = store.log_data(&log_ref("twice")).unwrap();
    assert_eq!(once.rows(), original.rows());
    assert_eq!(twice.rows(), original.rows());
}

#[tokio::test]
async fn test_progress_ends_at_one() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,1", "2,2"]);
    depth_log(&store, "b", &["GR"], &["3,3"]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = JobContext::new().with_progress(move |f| sink.lock().unwrap().push(f));

    splice_logs(&store, &request(&["a", "b"]), &test_config(), &ctx).await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last().copied(), Some(1.0));
}

#[tokio::test]
async fn test_log_creation_is_retried() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,1"]);
    store.inject_fault(StoreOp::AddLog, Fault::Communication);

    let outcome = splice_logs(&store, &request(&["a"]), &test_config(), &JobContext::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    assert_eq!(store.call_count(StoreOp::AddLog), 2);
    assert!(store.contains_log(&log_ref("spliced")));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let store = InMemoryStore::new();
    let err = splice_logs(&store, &request(&[]), &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Validation(_)));
}

#[tokio::test]
async fn test_blank_uid_is_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,1"]);

    let request = SpliceRequest::new(vec![log_ref("a")], "  ", "Spliced");
    let err = splice_logs(&store, &request, &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Validation(_)));
}

#[tokio::test]
async fn test_mixed_index_types_are_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,1"]);
    time_log(&store, "b", &["GR"], &["2024-03-01T10:00:00Z,1"]);

    let err = splice_logs(&store, &request(&["a", "b"]), &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Validation(_)));
    assert!(!store.contains_log(&log_ref("spliced")));
}

#[tokio::test]
async fn test_mixed_directions_are_rejected() {
    let store = InMemoryStore::new();
    depth_log(&store, "a", &["GR"], &["1,1"]);
    load_log(&store, "b", IndexType::Depth, Direction::Decreasing, &["GR"], &["1,1"]);

    let err = splice_logs(&store, &request(&["a", "b"]), &test_config(), &JobContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CurveError::Precondition(_)));
}

// =============================================================================
// Building Block Tests
// =============================================================================

#[test]
fn test_merge_curve_infos_last_definition_wins() {
    let store = InMemoryStore::new();
    let a = depth_log(&store, "a", &["GR", "ROP"], &[]);
    let mut b = depth_log(&store, "b", &["GR"], &[]);
    b.curves[1].unit = "API".to_string();

    let curves = merge_curve_infos(&[a, b]);
    let summary: Vec<_> = curves
        .iter()
        .map(|c| (c.mnemonic.as_str(), c.unit.as_str()))
        .collect();

    assert_eq!(summary, vec![("DEPTH", "m"), ("GR", "API"), ("ROP", "unitless")]);
}

#[test]
fn test_accumulator_orders_rows_by_direction() {
    let indexes = [depth("1"), depth("3"), depth("2")];
    let mut acc = SpliceAccumulator::new(Direction::Decreasing);
    acc.merge_curve("GR", indexes.iter().map(|i| (i, "v")));

    let store = InMemoryStore::new();
    let header = depth_log(&store, "a", &["GR"], &[]);
    let set = acc.into_row_set(wellcurve::protocol::CurveRowSet::for_header(
        &header,
        &["GR".to_string()],
    ));

    let order: Vec<_> = set.rows().iter().map(|r| r.index.to_string()).collect();
    assert_eq!(order, vec!["3", "2", "1"]);
}

#[test]
fn test_refresh_kind_for_new_log() {
    assert_eq!(RefreshAction::added(log_ref("x")).kind, RefreshKind::Add);
}
