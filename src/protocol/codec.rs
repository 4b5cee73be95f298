//! Row codec
//!
//! Encoding and decoding functions for comma-delimited curve rows.
//!
//! ## Wire Format
//!
//! ### Batch Header (sent once per batch)
//! ```text
//! mnemonics:  DEPTH,GR,ROP,TEMP
//! units:      m,gAPI,m/h,degC
//! ```
//!
//! ### Row
//! ```text
//! ┌──────────┬──────┬─────┬──────┐
//! │  index   │  GR  │ ROP │ TEMP │
//! ├──────────┼──────┼─────┼──────┤
//! │  1203.5  │ 81.2 │     │ 64.0 │   ->  "1203.5,81.2,,64.0"
//! └──────────┴──────┴─────┴──────┘
//! ```
//! A missing value is an empty string between delimiters, never omitted.

use std::io::{BufRead, Write};

use crate::error::{CurveError, Result};
use crate::index::{Index, IndexType};

use super::{CurveBatch, CurveRow, CurveRowSet};

/// Column delimiter for rows, mnemonic lists and unit lists
pub const DELIMITER: char = ',';

// =============================================================================
// List Encoding/Decoding
// =============================================================================

/// Split a comma-separated list, trimming each entry
pub fn split_list(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(DELIMITER).map(|s| s.trim().to_string()).collect()
}

/// Join entries into a comma-separated list
pub fn join_list(items: &[String]) -> String {
    items.join(&DELIMITER.to_string())
}

// =============================================================================
// Row Encoding/Decoding
// =============================================================================

/// Encode a row: index first, then every value (empty for missing)
pub fn encode_row(row: &CurveRow) -> String {
    let mut line = row.index.to_string();
    for value in &row.values {
        line.push(DELIMITER);
        line.push_str(value);
    }
    line
}

/// Decode a row with `width` data columns
///
/// Short rows are padded with empty values; rows with more values than
/// columns are rejected.
pub fn decode_row(line: &str, index_type: IndexType, uom: &str, width: usize) -> Result<CurveRow> {
    let mut fields = line.split(DELIMITER);

    let raw_index = fields
        .next()
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| CurveError::Parse(format!("Row has no index value: '{}'", line)))?;
    let index = Index::parse(raw_index, index_type, uom)?;

    let mut values: Vec<String> = fields.map(|f| f.trim().to_string()).collect();
    if values.len() > width {
        return Err(CurveError::Parse(format!(
            "Row at {} has {} values, expected at most {}",
            index,
            values.len(),
            width
        )));
    }
    values.resize(width, String::new());

    Ok(CurveRow::new(index, values))
}

// =============================================================================
// Batch Encoding/Decoding
// =============================================================================

/// Decode a wire batch into a row set
///
/// The first mnemonic and unit name the index curve.
pub fn decode_batch(batch: &CurveBatch, index_type: IndexType) -> Result<CurveRowSet> {
    let index_curve = batch.mnemonics.first().cloned().unwrap_or_default();
    let index_uom = batch.units.first().cloned().unwrap_or_default();
    let mnemonics: Vec<String> = batch.mnemonics.iter().skip(1).cloned().collect();
    let units: Vec<String> = batch.units.iter().skip(1).cloned().collect();
    let width = mnemonics.len();

    let mut set = CurveRowSet::new(index_type, index_curve, index_uom.clone(), mnemonics, units);
    for line in &batch.rows {
        set.push(decode_row(line, index_type, &index_uom, width)?);
    }
    Ok(set)
}

/// Encode a row set into a wire batch
pub fn encode_batch(set: &CurveRowSet) -> CurveBatch {
    encode_rows(set, set.rows())
}

/// Encode a slice of a set's rows with the set's header
pub fn encode_rows(set: &CurveRowSet, rows: &[CurveRow]) -> CurveBatch {
    let mut mnemonics = Vec::with_capacity(set.mnemonics().len() + 1);
    mnemonics.push(set.index_curve().to_string());
    mnemonics.extend(set.mnemonics().iter().cloned());

    let mut units = Vec::with_capacity(set.units().len() + 1);
    units.push(set.index_uom().to_string());
    units.extend(set.units().iter().cloned());

    CurveBatch::new(mnemonics, units, rows.iter().map(encode_row).collect())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a data file: mnemonic list, unit list, then one row per line
///
/// Blank lines are skipped.
pub fn read_data_file<R: BufRead>(reader: R) -> Result<CurveBatch> {
    let mut lines = reader
        .lines()
        .filter(|line| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true));

    let mnemonics = match lines.next() {
        Some(line) => split_list(&line?),
        None => return Err(CurveError::Parse("Data file is empty".to_string())),
    };
    let units = match lines.next() {
        Some(line) => split_list(&line?),
        None => return Err(CurveError::Parse("Data file has no unit line".to_string())),
    };
    if mnemonics.len() != units.len() {
        return Err(CurveError::Parse(format!(
            "{} mnemonics but {} units",
            mnemonics.len(),
            units.len()
        )));
    }

    let mut rows = Vec::new();
    for line in lines {
        rows.push(line?.trim_end().to_string());
    }

    Ok(CurveBatch::new(mnemonics, units, rows))
}

/// Write a batch in data file layout
pub fn write_data_file<W: Write>(writer: &mut W, batch: &CurveBatch) -> Result<()> {
    writeln!(writer, "{}", batch.mnemonic_list())?;
    writeln!(writer, "{}", batch.unit_list())?;
    for row in &batch.rows {
        writeln!(writer, "{}", row)?;
    }
    writer.flush()?;
    Ok(())
}
