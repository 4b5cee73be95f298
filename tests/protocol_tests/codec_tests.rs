//! Codec Tests
//!
//! Tests for row and batch encoding/decoding and the data file layout.

#[path = "../common/mod.rs"]
mod common;

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};

use tempfile::tempdir;
use wellcurve::protocol::{
    decode_batch, decode_row, encode_batch, encode_row, read_data_file, split_list,
    write_data_file, CurveRow,
};
use wellcurve::{CurveError, IndexType};

use common::{batch, depth, time};

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_split_list_trims_entries() {
    assert_eq!(split_list("DEPTH, GR ,ROP"), vec!["DEPTH", "GR", "ROP"]);
}

#[test]
fn test_split_empty_list() {
    assert!(split_list("   ").is_empty());
}

// =============================================================================
// Row Tests
// =============================================================================

#[test]
fn test_encode_row_keeps_missing_values() {
    let row = CurveRow::new(
        depth("1203.5"),
        vec!["81.2".to_string(), String::new(), "64.0".to_string()],
    );
    assert_eq!(encode_row(&row), "1203.5,81.2,,64.0");
}

#[test]
fn test_decode_row_pads_short_rows() {
    let row = decode_row("100,1", IndexType::Depth, "m", 3).unwrap();

    assert_eq!(row.index, depth("100"));
    assert_eq!(row.values, vec!["1", "", ""]);
    assert_eq!(row.value(0), Some("1"));
    assert_eq!(row.value(1), None);
}

#[test]
fn test_decode_row_rejects_extra_values() {
    let err = decode_row("100,1,2,3", IndexType::Depth, "m", 2).unwrap_err();
    assert!(matches!(err, CurveError::Parse(_)));
}

#[test]
fn test_decode_row_without_index_fails() {
    let err = decode_row(",1", IndexType::Depth, "m", 1).unwrap_err();
    assert!(matches!(err, CurveError::Parse(_)));
}

#[test]
fn test_decode_time_row() {
    let row = decode_row("2024-03-01T10:00:00Z,5", IndexType::DateTime, "", 1).unwrap();
    assert_eq!(row.index, time("2024-03-01T10:00:00Z"));
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_decode_batch_separates_index_curve() {
    let wire = batch("DEPTH", "m", &["GR", "ROP"], &["1,10,", "2,,20"]);
    let set = decode_batch(&wire, IndexType::Depth).unwrap();

    assert_eq!(set.index_curve(), "DEPTH");
    assert_eq!(set.index_uom(), "m");
    assert_eq!(set.mnemonics(), &["GR".to_string(), "ROP".to_string()]);
    assert_eq!(set.len(), 2);

    let gr: Vec<_> = set.curve_values("GR").map(|(i, v)| (i.clone(), v)).collect();
    assert_eq!(gr, vec![(depth("1"), "10")]);
}

#[test]
fn test_encode_batch_restores_wire_form() {
    let wire = batch("DEPTH", "m", &["GR", "ROP"], &["1,10,", "2,,20"]);
    let set = decode_batch(&wire, IndexType::Depth).unwrap();
    assert_eq!(encode_batch(&set), wire);
}

#[test]
fn test_decode_batch_with_bad_index_fails() {
    let wire = batch("DEPTH", "m", &["GR"], &["1,10", "abc,11"]);
    assert!(decode_batch(&wire, IndexType::Depth).is_err());
}

// =============================================================================
// Data File Tests
// =============================================================================

#[test]
fn test_read_data_file_skips_blank_lines() {
    let input = "DEPTH,GR\nm,gAPI\n\n1,10\n2,11\n";
    let wire = read_data_file(Cursor::new(input)).unwrap();

    assert_eq!(wire.mnemonics, vec!["DEPTH", "GR"]);
    assert_eq!(wire.units, vec!["m", "gAPI"]);
    assert_eq!(wire.rows, vec!["1,10", "2,11"]);
}

#[test]
fn test_read_data_file_requires_units() {
    let err = read_data_file(Cursor::new("DEPTH,GR\n")).unwrap_err();
    assert!(matches!(err, CurveError::Parse(_)));
}

#[test]
fn test_read_data_file_rejects_unit_count_mismatch() {
    let err = read_data_file(Cursor::new("DEPTH,GR\nm\n1,10\n")).unwrap_err();
    assert!(matches!(err, CurveError::Parse(_)));
}

#[test]
fn test_data_file_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let wire = batch("DEPTH", "m", &["GR", "ROP"], &["1,10,", "2,,20", "3,12,21"]);

    let mut writer = BufWriter::new(File::create(&path).unwrap());
    write_data_file(&mut writer, &wire).unwrap();
    drop(writer);

    let read = read_data_file(BufReader::new(File::open(&path).unwrap())).unwrap();
    assert_eq!(read, wire);
}
