//! Store queries
//!
//! Data queries and delete ranges sent to a [`LogStore`](super::LogStore).

use crate::index::Index;

use super::LogRef;

/// A data query against one log
///
/// The index curve is always returned as the first column, whether or not it
/// is listed in `mnemonics`. An empty mnemonic list selects every curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub log: LogRef,
    pub mnemonics: Vec<String>,

    /// Inclusive start in the direction of travel
    pub start: Option<Index>,

    /// Inclusive end in the direction of travel
    pub end: Option<Index>,

    /// Maximum rows to return
    pub max_rows: Option<usize>,

    /// Return the last N values of each curve instead of a range
    pub latest_values: Option<usize>,
}

impl DataQuery {
    /// Query every row of the given curves
    pub fn new(log: LogRef, mnemonics: Vec<String>) -> Self {
        Self {
            log,
            mnemonics,
            start: None,
            end: None,
            max_rows: None,
            latest_values: None,
        }
    }

    pub fn start(mut self, start: Option<Index>) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: Option<Index>) -> Self {
        self.end = end;
        self
    }

    pub fn max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }

    pub fn latest_values(mut self, count: usize) -> Self {
        self.latest_values = Some(count);
        self
    }
}

/// Range of values to delete from a log
///
/// An empty mnemonic list deletes every data curve; open bounds extend to the
/// start or end of the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteRange {
    pub mnemonics: Vec<String>,
    pub start: Option<Index>,
    pub end: Option<Index>,
}

impl DeleteRange {
    pub fn new(mnemonics: Vec<String>, start: Option<Index>, end: Option<Index>) -> Self {
        Self {
            mnemonics,
            start,
            end,
        }
    }
}
