//! In-memory store tests
//!
//! These tests verify:
//! - Range and latest-value queries
//! - Merge-by-index updates and curve creation
//! - Range deletes and header range refresh
//! - Fault injection and call counting

#[path = "../common/mod.rs"]
mod common;

use wellcurve::store::{
    DataQuery, DeleteRange, Fault, InMemoryStore, LogStore, ObjectSummary, StoreCapabilities,
    StoreOp,
};
use wellcurve::{CurveError, Direction, IndexType};

use common::{batch, curve_points, depth, depth_log, load_log, log_ref, WELL, WELLBORE};

fn points(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(i, v)| (i.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Query Tests
// =============================================================================

#[tokio::test]
async fn test_header_reports_ranges() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &["1,10,", "2,11,20", "3,,21"]);

    let header = store.get_log_header(&log_ref("log")).await.unwrap();

    assert_eq!(header.start_index, Some(depth("1")));
    assert_eq!(header.end_index, Some(depth("3")));
    let gr = header.curve("GR").unwrap();
    assert_eq!(gr.min_index, Some(depth("1")));
    assert_eq!(gr.max_index, Some(depth("2")));
    let rop = header.curve("ROP").unwrap();
    assert_eq!(rop.min_index, Some(depth("2")));
    assert_eq!(rop.max_index, Some(depth("3")));
}

#[tokio::test]
async fn test_depths_are_kept_at_advertised_precision() {
    let store = InMemoryStore::with_capabilities(StoreCapabilities {
        depth_decimal_precision: Some(2),
        ..StoreCapabilities::default()
    });
    let header = depth_log(&store, "log", &["GR"], &["1.004,1", "1.001,2", "2.006,3"]);

    assert_eq!(header.start_index, Some(depth("1")));
    assert_eq!(header.end_index, Some(depth("2.01")));
    let values: Vec<_> = curve_points(&store, "log", "GR").into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec!["2", "3"]);
}

#[tokio::test]
async fn test_decreasing_header_ranges_are_numeric() {
    let store = InMemoryStore::new();
    load_log(
        &store,
        "log",
        IndexType::Depth,
        Direction::Decreasing,
        &["GR"],
        &["1,10", "3,12", "2,11"],
    );

    let header = store.get_log_header(&log_ref("log")).await.unwrap();
    assert_eq!(header.start_index, Some(depth("3")));
    assert_eq!(header.end_index, Some(depth("1")));
    let gr = header.curve("GR").unwrap();
    assert_eq!(gr.min_index, Some(depth("1")));
    assert_eq!(gr.max_index, Some(depth("3")));
}

#[tokio::test]
async fn test_query_range_omits_rows_without_values() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &["1,10,", "2,,20", "3,12,21", "4,13,"]);

    let query = DataQuery::new(log_ref("log"), vec!["GR".to_string()])
        .start(Some(depth("1")))
        .end(Some(depth("3")));
    let data = store.get_log_data(&query).await.unwrap();

    assert_eq!(data.mnemonics, vec!["DEPTH", "GR"]);
    assert_eq!(data.rows, vec!["1,10", "3,12"]);
}

#[tokio::test]
async fn test_query_respects_max_rows() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,10", "2,11", "3,12"]);

    let query = DataQuery::new(log_ref("log"), Vec::new()).max_rows(2);
    let data = store.get_log_data(&query).await.unwrap();
    assert_eq!(data.rows, vec!["1,10", "2,11"]);
}

#[tokio::test]
async fn test_query_limited_by_capabilities() {
    let store = InMemoryStore::with_capabilities(StoreCapabilities {
        max_data_nodes: 10,
        max_data_points: 4,
        depth_decimal_precision: None,
    });
    depth_log(&store, "log", &["GR"], &["1,10", "2,11", "3,12"]);

    // Two columns (index + GR) and four points allow two rows
    let data = store
        .get_log_data(&DataQuery::new(log_ref("log"), Vec::new()))
        .await
        .unwrap();
    assert_eq!(data.len(), 2);
}

#[tokio::test]
async fn test_latest_values_per_curve() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &["1,10,20", "2,11,", "3,,"]);
    // Row 3 has no values and is dropped on load
    let query = DataQuery::new(log_ref("log"), Vec::new()).latest_values(1);
    let data = store.get_log_data(&query).await.unwrap();

    assert_eq!(data.rows, vec!["1,,20", "2,11,"]);
}

#[tokio::test]
async fn test_query_unknown_log_is_not_found() {
    let store = InMemoryStore::new();
    let err = store.get_log_header(&log_ref("missing")).await.unwrap_err();
    assert!(matches!(err, CurveError::NotFound(_)));
}

// =============================================================================
// Write Tests
// =============================================================================

#[tokio::test]
async fn test_update_merges_by_index() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,10", "3,12"]);

    let update = batch("DEPTH", "m", &["GR"], &["2,11", "3,", "1.0,99"]);
    store.update_log_data(&log_ref("log"), &update).await.unwrap();

    // Empty values never clear, and 1.0 merges with 1
    assert_eq!(
        curve_points(&store, "log", "GR"),
        points(&[("1", "99"), ("2", "11"), ("3", "12")])
    );
}

#[tokio::test]
async fn test_update_adds_unknown_curves() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,10"]);

    let update = batch("DEPTH", "m", &["ROP"], &["1,5", "2,6"]);
    store.update_log_data(&log_ref("log"), &update).await.unwrap();

    let header = store.header(&log_ref("log")).unwrap();
    assert_eq!(header.data_mnemonics(), vec!["GR", "ROP"]);
    assert_eq!(header.end_index, Some(depth("2")));
    assert_eq!(curve_points(&store, "log", "ROP"), points(&[("1", "5"), ("2", "6")]));
}

#[tokio::test]
async fn test_delete_range_clears_curve() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR", "ROP"], &["1,10,20", "2,11,21", "3,12,"]);

    let range = DeleteRange::new(vec!["GR".to_string()], Some(depth("2")), None);
    store.delete_log_data(&log_ref("log"), &range).await.unwrap();

    assert_eq!(curve_points(&store, "log", "GR"), points(&[("1", "10")]));
    // Row 3 had only GR and is gone
    let header = store.header(&log_ref("log")).unwrap();
    assert_eq!(header.end_index, Some(depth("2")));
}

#[tokio::test]
async fn test_add_existing_log_fails() {
    let store = InMemoryStore::new();
    let header = depth_log(&store, "log", &["GR"], &["1,10"]);

    let err = store.add_log(&header).await.unwrap_err();
    assert!(matches!(err, CurveError::Store(_)));
}

#[tokio::test]
async fn test_delete_log() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,10"]);

    store.delete_log(&log_ref("log")).await.unwrap();
    assert!(!store.contains_log(&log_ref("log")));
    assert!(store.delete_log(&log_ref("log")).await.is_err());
}

// =============================================================================
// Wellbore Object Tests
// =============================================================================

#[tokio::test]
async fn test_list_wellbore_objects_sorted() {
    let store = InMemoryStore::new();
    depth_log(&store, "b-log", &["GR"], &["1,10"]);
    depth_log(&store, "a-log", &["GR"], &["1,10"]);
    let wellbore = log_ref("a-log").wellbore();
    store.register_object(wellbore.clone(), ObjectSummary::new("bhaRun", "run-1", "Run 1"));

    let objects = store.list_wellbore_objects(&wellbore).await.unwrap();
    let keys: Vec<_> = objects.iter().map(|o| (o.kind.as_str(), o.uid.as_str())).collect();

    assert_eq!(keys, vec![("bhaRun", "run-1"), ("log", "a-log"), ("log", "b-log")]);
    assert_eq!(wellbore.well_uid, WELL);
    assert_eq!(wellbore.wellbore_uid, WELLBORE);
}

// =============================================================================
// Fault Injection Tests
// =============================================================================

#[tokio::test]
async fn test_injected_faults_fire_once_in_order() {
    let store = InMemoryStore::new();
    depth_log(&store, "log", &["GR"], &["1,10"]);
    store.inject_fault(StoreOp::GetHeader, Fault::Timeout);
    store.inject_fault(StoreOp::GetHeader, Fault::Rejected("nope".to_string()));

    let first = store.get_log_header(&log_ref("log")).await.unwrap_err();
    let second = store.get_log_header(&log_ref("log")).await.unwrap_err();
    let third = store.get_log_header(&log_ref("log")).await;

    assert!(first.is_transient());
    assert!(matches!(second, CurveError::Store(_)));
    assert!(!second.is_transient());
    assert!(third.is_ok());
    assert_eq!(store.call_count(StoreOp::GetHeader), 3);
}
