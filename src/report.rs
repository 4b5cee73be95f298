//! Reports
//!
//! Structured results of the analysis and comparison jobs. Items are built
//! by the algorithms and owned by the report they end up in.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::index::{Delta, Index};

/// Result of one analysis or comparison job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub summary: String,

    /// Set when the report was truncated or is otherwise incomplete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, items: Vec<ReportItem>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            warning: None,
            items,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Gap items, in report order
    pub fn gaps(&self) -> impl Iterator<Item = &GapReportItem> {
        self.items.iter().filter_map(|item| match item {
            ReportItem::Gap(gap) => Some(gap),
            _ => None,
        })
    }

    /// QC items, in report order
    pub fn qc_items(&self) -> impl Iterator<Item = &QcReportItem> {
        self.items.iter().filter_map(|item| match item {
            ReportItem::Qc(qc) => Some(qc),
            _ => None,
        })
    }

    /// Comparison items, in report order
    pub fn mismatches(&self) -> impl Iterator<Item = &CompareReportItem> {
        self.items.iter().filter_map(|item| match item {
            ReportItem::Compare(mismatch) => Some(mismatch),
            _ => None,
        })
    }

    /// Consistency items, in report order
    pub fn inconsistencies(&self) -> impl Iterator<Item = &ConsistencyReportItem> {
        self.items.iter().filter_map(|item| match item {
            ReportItem::Consistency(item) => Some(item),
            _ => None,
        })
    }

    /// Wellbore object items, in report order
    pub fn object_differences(&self) -> impl Iterator<Item = &WellboreObjectReportItem> {
        self.items.iter().filter_map(|item| match item {
            ReportItem::WellboreObject(item) => Some(item),
            _ => None,
        })
    }
}

/// One line of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportItem {
    Gap(GapReportItem),
    Qc(QcReportItem),
    Compare(CompareReportItem),
    Consistency(ConsistencyReportItem),
    WellboreObject(WellboreObjectReportItem),
}

/// A stretch of missing values between two present ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReportItem {
    pub mnemonic: String,
    /// Last index with a value before the gap
    pub start: Index,
    /// First index with a value after the gap
    pub end: Index,
    pub size: Delta,
}

/// Issue found by the minimum-data QC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QcIssue {
    /// Curve missing from the log header
    NotFound,
    /// No data points in the checked range
    NoData,
    /// A gap at least as large as the threshold
    LargeGap,
    /// Fewer points per index unit than required
    LowDensity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcReportItem {
    pub mnemonic: String,
    pub issues: Vec<QcIssue>,
    pub data_points: usize,

    /// Points per index unit (per hour for time logs), when measured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<Decimal>,

    /// First gap at or above the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_gap: Option<GapReportItem>,
}

impl QcReportItem {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            issues: Vec::new(),
            data_points: 0,
            density: None,
            large_gap: None,
        }
    }

    pub fn has_issue(&self, issue: QcIssue) -> bool {
        self.issues.contains(&issue)
    }
}

/// A value that differs between source and target at one index
///
/// A missing side is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareReportItem {
    pub mnemonic: String,
    pub index: Index,
    pub source_value: Option<String>,
    pub target_value: Option<String>,
}

/// Header boundaries of a curve next to the boundaries found in its data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReportItem {
    pub mnemonic: String,
    pub header_start: Option<String>,
    pub header_end: Option<String>,
    pub data_start: Option<String>,
    pub data_end: Option<String>,
}

/// A wellbore object that is missing on one side or named differently
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellboreObjectReportItem {
    pub kind: String,
    pub uid: String,
    pub source_name: Option<String>,
    pub target_name: Option<String>,
}
