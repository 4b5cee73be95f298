//! Header metadata
//!
//! Object identities, log headers and per-curve index ranges as reported by
//! the store.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::index::{Direction, Index, IndexType};
use crate::protocol::CurveBatch;

/// Identity of a log within a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LogRef {
    pub well_uid: String,
    pub wellbore_uid: String,
    pub uid: String,
}

impl LogRef {
    pub fn new(
        well_uid: impl Into<String>,
        wellbore_uid: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            well_uid: well_uid.into(),
            wellbore_uid: wellbore_uid.into(),
            uid: uid.into(),
        }
    }

    /// The wellbore this log belongs to
    pub fn wellbore(&self) -> WellboreRef {
        WellboreRef::new(self.well_uid.clone(), self.wellbore_uid.clone())
    }

    /// A sibling log in the same wellbore
    pub fn sibling(&self, uid: impl Into<String>) -> LogRef {
        LogRef::new(self.well_uid.clone(), self.wellbore_uid.clone(), uid)
    }
}

impl fmt::Display for LogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "well {}, wellbore {}, log {}", self.well_uid, self.wellbore_uid, self.uid)
    }
}

/// Identity of a wellbore within a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WellboreRef {
    pub well_uid: String,
    pub wellbore_uid: String,
}

impl WellboreRef {
    pub fn new(well_uid: impl Into<String>, wellbore_uid: impl Into<String>) -> Self {
        Self {
            well_uid: well_uid.into(),
            wellbore_uid: wellbore_uid.into(),
        }
    }
}

impl fmt::Display for WellboreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "well {}, wellbore {}", self.well_uid, self.wellbore_uid)
    }
}

/// Summary of any object stored under a wellbore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub kind: String,
    pub uid: String,
    pub name: String,
}

impl ObjectSummary {
    pub fn new(kind: impl Into<String>, uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uid: uid.into(),
            name: name.into(),
        }
    }
}

/// Definition of one curve in a log header
#[derive(Debug, Clone, PartialEq)]
pub struct LogCurveInfo {
    pub mnemonic: String,
    pub unit: String,
    /// Numerically smallest index carrying a value
    pub min_index: Option<Index>,
    /// Numerically largest index carrying a value
    pub max_index: Option<Index>,
}

impl LogCurveInfo {
    pub fn new(mnemonic: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            unit: unit.into(),
            min_index: None,
            max_index: None,
        }
    }

    /// Declared range, when both bounds are known
    pub fn range(&self) -> Option<MnemonicRange> {
        match (&self.min_index, &self.max_index) {
            (Some(min), Some(max)) => Some(MnemonicRange::new(min.clone(), max.clone())),
            _ => None,
        }
    }
}

/// Header of a log: identity, index definition, boundaries and curves
///
/// `curves` always starts with the index curve.
#[derive(Debug, Clone, PartialEq)]
pub struct LogHeader {
    pub log: LogRef,
    pub name: String,
    pub well_name: String,
    pub wellbore_name: String,
    pub index_type: IndexType,
    pub direction: Direction,
    pub index_curve: String,
    pub index_uom: String,
    /// First index in the direction of travel
    pub start_index: Option<Index>,
    /// Last index in the direction of travel
    pub end_index: Option<Index>,
    pub curves: Vec<LogCurveInfo>,
}

impl LogHeader {
    /// Create a header holding only the index curve
    pub fn new(
        log: LogRef,
        name: impl Into<String>,
        index_type: IndexType,
        direction: Direction,
        index_curve: impl Into<String>,
        index_uom: impl Into<String>,
    ) -> Self {
        let index_curve = index_curve.into();
        let index_uom = index_uom.into();
        Self {
            well_name: log.well_uid.clone(),
            wellbore_name: log.wellbore_uid.clone(),
            log,
            name: name.into(),
            index_type,
            direction,
            curves: vec![LogCurveInfo::new(index_curve.clone(), index_uom.clone())],
            index_curve,
            index_uom,
            start_index: None,
            end_index: None,
        }
    }

    /// Header matching the columns of a wire batch (first column is the index)
    pub fn from_batch(
        log: LogRef,
        name: impl Into<String>,
        index_type: IndexType,
        direction: Direction,
        batch: &CurveBatch,
    ) -> Self {
        let index_curve = batch.mnemonics.first().cloned().unwrap_or_default();
        let index_uom = batch.units.first().cloned().unwrap_or_default();
        let mut header = Self::new(log, name, index_type, direction, index_curve, index_uom);
        for (position, mnemonic) in batch.mnemonics.iter().enumerate().skip(1) {
            let unit = batch.units.get(position).cloned().unwrap_or_default();
            header = header.with_curve(mnemonic.clone(), unit);
        }
        header
    }

    /// Add a data curve definition
    pub fn with_curve(mut self, mnemonic: impl Into<String>, unit: impl Into<String>) -> Self {
        self.curves.push(LogCurveInfo::new(mnemonic, unit));
        self
    }

    /// Set display names of the parent well and wellbore
    pub fn with_parent_names(mut self, well: impl Into<String>, wellbore: impl Into<String>) -> Self {
        self.well_name = well.into();
        self.wellbore_name = wellbore.into();
        self
    }

    pub fn curve(&self, mnemonic: &str) -> Option<&LogCurveInfo> {
        self.curves.iter().find(|c| c.mnemonic == mnemonic)
    }

    pub fn has_curve(&self, mnemonic: &str) -> bool {
        self.curve(mnemonic).is_some()
    }

    pub fn is_index_curve(&self, mnemonic: &str) -> bool {
        self.index_curve == mnemonic
    }

    /// Every curve except the index curve, in header order
    pub fn data_mnemonics(&self) -> Vec<String> {
        self.curves
            .iter()
            .filter(|c| !self.is_index_curve(&c.mnemonic))
            .map(|c| c.mnemonic.clone())
            .collect()
    }

    /// Requested data curves that exist in this header, in request order
    ///
    /// An empty request selects every data curve.
    pub fn select_mnemonics(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            return self.data_mnemonics();
        }
        let mut selected: Vec<String> = Vec::new();
        for mnemonic in requested {
            if self.has_curve(mnemonic)
                && !self.is_index_curve(mnemonic)
                && !selected.contains(mnemonic)
            {
                selected.push(mnemonic.clone());
            }
        }
        selected
    }

    /// Declared range per data curve; curves without data are absent
    pub fn mnemonic_ranges(&self) -> HashMap<String, MnemonicRange> {
        self.curves
            .iter()
            .filter(|c| !self.is_index_curve(&c.mnemonic))
            .filter_map(|c| c.range().map(|r| (c.mnemonic.clone(), r)))
            .collect()
    }

    /// Human-readable identity for user-facing messages
    pub fn describe(&self) -> String {
        format!(
            "well '{}', wellbore '{}', log '{}' ({})",
            self.well_name, self.wellbore_name, self.name, self.log.uid
        )
    }
}

/// Declared [min, max] index bounds of one curve
#[derive(Debug, Clone, PartialEq)]
pub struct MnemonicRange {
    pub min: Index,
    pub max: Index,
}

impl MnemonicRange {
    pub fn new(min: Index, max: Index) -> Self {
        Self { min, max }
    }

    /// Inclusive containment, independent of which bound is numerically lower
    pub fn contains(&self, index: &Index) -> Result<bool> {
        let (low, high) = if self.min.compare(&self.max)? == Ordering::Greater {
            (&self.max, &self.min)
        } else {
            (&self.min, &self.max)
        };
        Ok(index.compare(low)? != Ordering::Less && index.compare(high)? != Ordering::Greater)
    }
}

/// Limits advertised by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// Maximum rows returned by one data query
    pub max_data_nodes: usize,

    /// Maximum values (rows x columns) returned by one data query
    pub max_data_points: usize,

    /// Number of decimals the store keeps for depth values, when known
    pub depth_decimal_precision: Option<u32>,
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self {
            max_data_nodes: 10_000,
            max_data_points: 1_000_000,
            depth_decimal_precision: None,
        }
    }
}

impl StoreCapabilities {
    /// Rows per request for a given number of columns (index included)
    pub fn rows_per_request(&self, columns: usize, client_limit: usize) -> usize {
        let by_points = self.max_data_points / columns.max(1);
        self.max_data_nodes.min(by_points).min(client_limit).max(1)
    }
}
