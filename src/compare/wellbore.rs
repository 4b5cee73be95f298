//! Wellbore Sub-Object Comparator
//!
//! Lists the objects of a wellbore on two stores and reports the ones that
//! exist on one side only or are named differently.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::Result;
use crate::job::JobContext;
use crate::report::{Report, ReportItem, WellboreObjectReportItem};
use crate::store::{LogStore, ObjectSummary, WellboreRef};

/// Parameters of a wellbore comparison
#[derive(Debug, Clone, PartialEq)]
pub struct WellboreCompareRequest {
    pub source: WellboreRef,
    pub target: WellboreRef,
}

impl WellboreCompareRequest {
    pub fn new(source: WellboreRef, target: WellboreRef) -> Self {
        Self { source, target }
    }
}

/// Differences between two object lists, in (kind, uid) order
///
/// Returns the items, at most `cap` of them, and whether more were found.
pub fn diff_objects(
    source: &[ObjectSummary],
    target: &[ObjectSummary],
    cap: usize,
) -> (Vec<WellboreObjectReportItem>, bool) {
    let mut sides: BTreeMap<(&str, &str), (Option<&str>, Option<&str>)> = BTreeMap::new();
    for object in source {
        sides.entry((object.kind.as_str(), object.uid.as_str())).or_default().0 = Some(object.name.as_str());
    }
    for object in target {
        sides.entry((object.kind.as_str(), object.uid.as_str())).or_default().1 = Some(object.name.as_str());
    }

    let mut items = Vec::new();
    for ((kind, uid), (source_name, target_name)) in sides {
        if source_name == target_name {
            continue;
        }
        if items.len() >= cap {
            return (items, true);
        }
        items.push(WellboreObjectReportItem {
            kind: kind.to_string(),
            uid: uid.to_string(),
            source_name: source_name.map(str::to_string),
            target_name: target_name.map(str::to_string),
        });
    }
    (items, false)
}

/// Compare the objects of a wellbore on two stores
pub async fn compare_wellbores(
    source_store: &dyn LogStore,
    target_store: &dyn LogStore,
    request: &WellboreCompareRequest,
    config: &Config,
    ctx: &JobContext,
) -> Result<Report> {
    let (source, target) = futures::try_join!(
        source_store.list_wellbore_objects(&request.source),
        target_store.list_wellbore_objects(&request.target)
    )?;
    ctx.report_progress(0.5);

    let (items, truncated) = diff_objects(&source, &target, config.mismatch_cap);
    ctx.report_progress(1.0);

    tracing::info!(
        source = %request.source,
        target = %request.target,
        differences = items.len(),
        "Wellbore comparison finished"
    );

    let summary = format!(
        "{} object differences between {} and {}",
        items.len(),
        request.source,
        request.target
    );
    let report = Report::new(
        "Wellbore comparison",
        summary,
        items.into_iter().map(ReportItem::WellboreObject).collect(),
    );
    if truncated {
        tracing::warn!(cap = config.mismatch_cap, "Mismatch cap reached, comparison stopped");
        return Ok(report.with_warning(format!(
            "Comparison stopped after {} differences; the report is incomplete",
            config.mismatch_cap
        )));
    }
    Ok(report)
}
