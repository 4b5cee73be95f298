//! Curve rows
//!
//! Wire batches as received from the store and their decoded form.

use crate::index::{Index, IndexType};
use crate::store::LogHeader;

use super::codec::join_list;

/// A batch of curve data in wire form
///
/// The mnemonic and unit lists are parallel; the first entry of each names
/// the index curve. Every row is one comma-separated string, index first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveBatch {
    pub mnemonics: Vec<String>,
    pub units: Vec<String>,
    pub rows: Vec<String>,
}

impl CurveBatch {
    pub fn new(mnemonics: Vec<String>, units: Vec<String>, rows: Vec<String>) -> Self {
        Self {
            mnemonics,
            units,
            rows,
        }
    }

    /// Comma-separated mnemonic list as sent on the wire
    pub fn mnemonic_list(&self) -> String {
        join_list(&self.mnemonics)
    }

    /// Comma-separated unit list as sent on the wire
    pub fn unit_list(&self) -> String {
        join_list(&self.units)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One decoded row: the index plus one raw value per data column
///
/// An empty string means "no value" for that column at this index.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRow {
    pub index: Index,
    pub values: Vec<String>,
}

impl CurveRow {
    pub fn new(index: Index, values: Vec<String>) -> Self {
        Self { index, values }
    }

    /// Value at a data column, `None` when empty or out of range
    pub fn value(&self, column: usize) -> Option<&str> {
        self.values
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// True when at least one data column carries a value
    pub fn has_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_empty())
    }
}

/// Ordered rows sharing one mnemonic list
///
/// The index curve is kept apart from the data columns: `mnemonics()` and
/// `units()` describe the values of each row, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRowSet {
    index_type: IndexType,
    index_curve: String,
    index_uom: String,
    mnemonics: Vec<String>,
    units: Vec<String>,
    rows: Vec<CurveRow>,
}

impl CurveRowSet {
    /// Create an empty set with the given columns
    pub fn new(
        index_type: IndexType,
        index_curve: impl Into<String>,
        index_uom: impl Into<String>,
        mnemonics: Vec<String>,
        units: Vec<String>,
    ) -> Self {
        let mut units = units;
        units.resize(mnemonics.len(), String::new());
        Self {
            index_type,
            index_curve: index_curve.into(),
            index_uom: index_uom.into(),
            mnemonics,
            units,
            rows: Vec::new(),
        }
    }

    /// Create an empty set for some of a log's curves, units taken from the header
    pub fn for_header(header: &LogHeader, mnemonics: &[String]) -> Self {
        let units = mnemonics
            .iter()
            .map(|m| header.curve(m).map(|c| c.unit.clone()).unwrap_or_default())
            .collect();
        Self::new(
            header.index_type,
            header.index_curve.clone(),
            header.index_uom.clone(),
            mnemonics.to_vec(),
            units,
        )
    }

    /// Same columns, different rows
    pub fn with_rows(&self, rows: Vec<CurveRow>) -> Self {
        let mut set = Self::new(
            self.index_type,
            self.index_curve.clone(),
            self.index_uom.clone(),
            self.mnemonics.clone(),
            self.units.clone(),
        );
        for row in rows {
            set.push(row);
        }
        set
    }

    /// Append a row, padding or truncating its values to the column count
    pub fn push(&mut self, mut row: CurveRow) {
        row.values.resize(self.mnemonics.len(), String::new());
        self.rows.push(row);
    }

    /// Append the rows of another set, matching columns by mnemonic
    ///
    /// Columns of `other` unknown to this set are dropped.
    pub fn append(&mut self, other: CurveRowSet) {
        if other.mnemonics == self.mnemonics {
            self.rows.extend(other.rows);
            return;
        }

        let mapping: Vec<Option<usize>> = self
            .mnemonics
            .iter()
            .map(|m| other.column(m))
            .collect();

        for row in other.rows {
            let values = mapping
                .iter()
                .map(|source| {
                    source
                        .and_then(|col| row.values.get(col).cloned())
                        .unwrap_or_default()
                })
                .collect();
            self.rows.push(CurveRow::new(row.index, values));
        }
    }

    /// Column position of a data mnemonic
    pub fn column(&self, mnemonic: &str) -> Option<usize> {
        self.mnemonics.iter().position(|m| m == mnemonic)
    }

    /// Value of `mnemonic` in `row`, `None` when empty or unknown
    pub fn value<'a>(&self, row: &'a CurveRow, mnemonic: &str) -> Option<&'a str> {
        self.column(mnemonic).and_then(|col| row.value(col))
    }

    /// Every (index, value) pair where `mnemonic` has a value, in row order
    pub fn curve_values<'a>(&'a self, mnemonic: &str) -> impl Iterator<Item = (&'a Index, &'a str)> + 'a {
        let column = self.column(mnemonic);
        self.rows.iter().filter_map(move |row| {
            let col = column?;
            row.value(col).map(|v| (&row.index, v))
        })
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn index_curve(&self) -> &str {
        &self.index_curve
    }

    pub fn index_uom(&self) -> &str {
        &self.index_uom
    }

    pub fn mnemonics(&self) -> &[String] {
        &self.mnemonics
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn rows(&self) -> &[CurveRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<CurveRow> {
        self.rows
    }

    pub fn first(&self) -> Option<&CurveRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&CurveRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
