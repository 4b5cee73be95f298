//! In-memory store
//!
//! A `LogStore` kept entirely in process memory.
//!
//! ## Semantics
//! - Rows are kept sorted in each log's direction of travel
//! - Updates merge by index; empty incoming values never clear data
//! - Depth indexes are rounded to the advertised decimal precision
//! - Curves unknown to a log are added on first write
//! - Rows left without any value are dropped
//! - Header start/end and per-curve ranges are recomputed after every write
//!
//! ## Concurrency
//! - `logs`: parking_lot RwLock (many concurrent readers, exclusive writer)
//! - No lock is held across an await point; every trait method delegates
//!   to a synchronous helper

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::error::{CurveError, Result};
use crate::index::{Index, IndexKey};
use crate::protocol::{decode_batch, encode_row, CurveBatch, CurveRow, CurveRowSet};

use super::{
    DataQuery, DeleteRange, LogCurveInfo, LogHeader, LogRef, LogStore, ObjectSummary,
    StoreCapabilities, WellboreRef,
};

/// Store operations, used to inject faults and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetHeader,
    GetData,
    AddLog,
    UpdateData,
    DeleteData,
    DeleteLog,
    Capabilities,
    ListObjects,
}

/// A failure the store returns instead of running an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Timeout,
    Communication,
    Rejected(String),
}

/// Depth indexes are kept at the advertised precision
fn stored_index(index: Index, precision: Option<u32>) -> Index {
    match (index, precision) {
        (Index::Depth { value, uom }, Some(places)) => Index::depth(value.round_dp(places), uom),
        (index, _) => index,
    }
}

impl Fault {
    fn into_error(self, op: StoreOp) -> CurveError {
        match self {
            Fault::Timeout => CurveError::Timeout(format!("{:?} timed out", op)),
            Fault::Communication => CurveError::Communication(format!("{:?} lost connection", op)),
            Fault::Rejected(reason) => CurveError::Store(reason),
        }
    }
}

/// A log and its rows
///
/// Row values are aligned with the header's data curves (every curve but the
/// index curve, in header order).
struct StoredLog {
    header: LogHeader,
    rows: Vec<CurveRow>,
}

impl StoredLog {
    fn new(mut header: LogHeader) -> Self {
        let index_unit = header
            .curve(&header.index_curve)
            .map(|c| c.unit.clone())
            .unwrap_or_else(|| header.index_uom.clone());
        let index_curve = header.index_curve.clone();

        header.curves.retain(|c| c.mnemonic != index_curve);
        header.curves.insert(0, LogCurveInfo::new(index_curve, index_unit));
        for curve in header.curves.iter_mut() {
            curve.min_index = None;
            curve.max_index = None;
        }
        header.start_index = None;
        header.end_index = None;

        Self {
            header,
            rows: Vec::new(),
        }
    }

    fn data_mnemonics(&self) -> Vec<String> {
        self.header.data_mnemonics()
    }

    fn column(&self, mnemonic: &str) -> Option<usize> {
        self.data_mnemonics().iter().position(|m| m == mnemonic)
    }

    /// Add a data curve, returning its column
    fn add_curve(&mut self, mnemonic: &str, unit: &str) -> usize {
        self.header.curves.push(LogCurveInfo::new(mnemonic, unit));
        for row in self.rows.iter_mut() {
            row.values.push(String::new());
        }
        self.data_mnemonics().len() - 1
    }

    /// Column positions for a requested mnemonic list (empty = all)
    fn columns(&self, mnemonics: &[String]) -> Vec<usize> {
        let all = self.data_mnemonics();
        if mnemonics.is_empty() {
            return (0..all.len()).collect();
        }
        let mut columns = Vec::new();
        for mnemonic in mnemonics {
            if let Some(col) = all.iter().position(|m| m == mnemonic) {
                if !columns.contains(&col) {
                    columns.push(col);
                }
            }
        }
        columns
    }

    fn in_range(&self, index: &Index, start: Option<&Index>, end: Option<&Index>) -> Result<bool> {
        let direction = self.header.direction;
        if let Some(start) = start {
            if direction.order(index, start)? == Ordering::Less {
                return Ok(false);
            }
        }
        if let Some(end) = end {
            if direction.order(index, end)? == Ordering::Greater {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn sort_rows(&mut self) {
        let direction = self.header.direction;
        self.rows
            .sort_by(|a, b| direction.order_keys(&a.index.key(), &b.index.key()));
    }

    /// Recompute header boundaries and per-curve ranges from the rows
    fn refresh_ranges(&mut self) {
        let increasing = self.header.direction.is_increasing();
        let first = self.rows.first().map(|r| r.index.clone());
        let last = self.rows.last().map(|r| r.index.clone());

        let numeric = |first: Option<Index>, last: Option<Index>| {
            if increasing {
                (first, last)
            } else {
                (last, first)
            }
        };

        let mut ranges: HashMap<String, (Option<Index>, Option<Index>)> = HashMap::new();
        for (col, mnemonic) in self.data_mnemonics().into_iter().enumerate() {
            let mut present = self.rows.iter().filter(|r| r.value(col).is_some());
            let first_value = present.next().map(|r| r.index.clone());
            let last_value = present.last().map(|r| r.index.clone()).or_else(|| first_value.clone());
            ranges.insert(mnemonic, numeric(first_value, last_value));
        }
        ranges.insert(self.header.index_curve.clone(), numeric(first.clone(), last.clone()));

        for curve in self.header.curves.iter_mut() {
            let (min, max) = ranges.remove(&curve.mnemonic).unwrap_or((None, None));
            curve.min_index = min;
            curve.max_index = max;
        }
        self.header.start_index = first;
        self.header.end_index = last;
    }

    fn batch(&self, columns: &[usize], rows: Vec<CurveRow>) -> CurveBatch {
        let data = self.data_mnemonics();
        let mut mnemonics = vec![self.header.index_curve.clone()];
        let mut units = vec![self.header.index_uom.clone()];
        for &col in columns {
            let mnemonic = &data[col];
            mnemonics.push(mnemonic.clone());
            units.push(self.header.curve(mnemonic).map(|c| c.unit.clone()).unwrap_or_default());
        }
        CurveBatch::new(mnemonics, units, rows.iter().map(encode_row).collect())
    }
}

fn project(row: &CurveRow, columns: &[usize]) -> CurveRow {
    let values = columns
        .iter()
        .map(|&col| row.values.get(col).cloned().unwrap_or_default())
        .collect();
    CurveRow::new(row.index.clone(), values)
}

fn missing(log: &LogRef) -> CurveError {
    CurveError::NotFound(format!("{}", log))
}

/// In-process [`LogStore`] implementation
///
/// Besides serving the trait it can queue faults per operation and counts
/// every call it receives.
pub struct InMemoryStore {
    logs: RwLock<HashMap<LogRef, StoredLog>>,
    objects: RwLock<HashMap<WellboreRef, Vec<ObjectSummary>>>,
    capabilities: StoreCapabilities,
    faults: Mutex<HashMap<StoreOp, VecDeque<Fault>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl InMemoryStore {
    /// Create an empty store with default capabilities
    pub fn new() -> Self {
        Self::with_capabilities(StoreCapabilities::default())
    }

    /// Create an empty store advertising the given capabilities
    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            objects: RwLock::new(HashMap::new()),
            capabilities,
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Setup and Inspection
    // =========================================================================

    /// Create a log and merge a batch of rows into it
    pub fn load(&self, header: LogHeader, data: &CurveBatch) -> Result<()> {
        self.insert_log(&header)?;
        if !data.is_empty() {
            self.merge_rows(&header.log, data)?;
        }
        Ok(())
    }

    /// Register a non-log object under a wellbore
    pub fn register_object(&self, wellbore: WellboreRef, object: ObjectSummary) {
        self.objects.write().entry(wellbore).or_default().push(object);
    }

    /// Fail the next call of `op` with `fault` (faults queue in order)
    pub fn inject_fault(&self, op: StoreOp, fault: Fault) {
        self.faults.lock().entry(op).or_default().push_back(fault);
    }

    /// Number of calls received for `op`, including failed ones
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn contains_log(&self, log: &LogRef) -> bool {
        self.logs.read().contains_key(log)
    }

    /// Every log identity, sorted
    pub fn log_refs(&self) -> Vec<LogRef> {
        let mut refs: Vec<LogRef> = self.logs.read().keys().cloned().collect();
        refs.sort();
        refs
    }

    /// Current header of a log
    pub fn header(&self, log: &LogRef) -> Option<LogHeader> {
        self.logs.read().get(log).map(|s| s.header.clone())
    }

    /// Every row of a log, all data curves
    pub fn log_data(&self, log: &LogRef) -> Result<CurveRowSet> {
        let logs = self.logs.read();
        let stored = logs.get(log).ok_or_else(|| missing(log))?;
        let mut set = CurveRowSet::for_header(&stored.header, &stored.data_mnemonics());
        for row in &stored.rows {
            set.push(row.clone());
        }
        Ok(set)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn begin(&self, op: StoreOp) -> Result<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        let fault = self.faults.lock().get_mut(&op).and_then(|q| q.pop_front());
        match fault {
            Some(fault) => Err(fault.into_error(op)),
            None => Ok(()),
        }
    }

    fn insert_log(&self, header: &LogHeader) -> Result<()> {
        let mut logs = self.logs.write();
        if logs.contains_key(&header.log) {
            return Err(CurveError::Store(format!("{} already exists", header.log)));
        }
        logs.insert(header.log.clone(), StoredLog::new(header.clone()));
        Ok(())
    }

    fn query(&self, query: &DataQuery) -> Result<CurveBatch> {
        let logs = self.logs.read();
        let stored = logs.get(&query.log).ok_or_else(|| missing(&query.log))?;
        let columns = stored.columns(&query.mnemonics);

        let rows = match query.latest_values {
            Some(count) => Self::latest_rows(stored, &columns, count),
            None => {
                let limit = self
                    .capabilities
                    .rows_per_request(columns.len() + 1, query.max_rows.unwrap_or(usize::MAX));
                Self::range_rows(stored, &columns, query, limit)?
            }
        };

        Ok(stored.batch(&columns, rows))
    }

    fn range_rows(
        stored: &StoredLog,
        columns: &[usize],
        query: &DataQuery,
        limit: usize,
    ) -> Result<Vec<CurveRow>> {
        let direction = stored.header.direction;
        let mut rows = Vec::new();
        for row in &stored.rows {
            if let Some(start) = &query.start {
                if direction.order(&row.index, start)? == Ordering::Less {
                    continue;
                }
            }
            if let Some(end) = &query.end {
                if direction.order(&row.index, end)? == Ordering::Greater {
                    break;
                }
            }
            let projected = project(row, columns);
            if !projected.has_values() {
                continue;
            }
            rows.push(projected);
            if rows.len() >= limit {
                break;
            }
        }
        Ok(rows)
    }

    /// Last `count` values of every column, merged into rows in log order
    fn latest_rows(stored: &StoredLog, columns: &[usize], count: usize) -> Vec<CurveRow> {
        let mut picked: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (slot, &col) in columns.iter().enumerate() {
            let latest = stored
                .rows
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, row)| row.value(col).is_some())
                .take(count);
            for (position, row) in latest {
                let values = picked
                    .entry(position)
                    .or_insert_with(|| vec![String::new(); columns.len()]);
                values[slot] = row.values[col].clone();
            }
        }
        picked
            .into_iter()
            .map(|(position, values)| CurveRow::new(stored.rows[position].index.clone(), values))
            .collect()
    }

    fn merge_rows(&self, log: &LogRef, data: &CurveBatch) -> Result<()> {
        let mut logs = self.logs.write();
        let stored = logs.get_mut(log).ok_or_else(|| missing(log))?;
        let incoming = decode_batch(data, stored.header.index_type)?;

        let mut mapping = Vec::with_capacity(incoming.mnemonics().len());
        for (position, mnemonic) in incoming.mnemonics().iter().enumerate() {
            if stored.header.is_index_curve(mnemonic) {
                mapping.push(None);
                continue;
            }
            let col = match stored.column(mnemonic) {
                Some(col) => col,
                None => stored.add_curve(mnemonic, &incoming.units()[position]),
            };
            mapping.push(Some(col));
        }

        let width = stored.data_mnemonics().len();
        let mut by_key: BTreeMap<IndexKey, CurveRow> = stored
            .rows
            .drain(..)
            .map(|row| (row.index.key(), row))
            .collect();

        let precision = self.capabilities.depth_decimal_precision;
        for row in incoming.into_rows() {
            let index = stored_index(row.index, precision);
            let entry = by_key
                .entry(index.key())
                .or_insert_with(|| CurveRow::new(index, vec![String::new(); width]));
            for (position, value) in row.values.into_iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                if let Some(Some(col)) = mapping.get(position) {
                    entry.values[*col] = value;
                }
            }
        }

        stored.rows = by_key.into_values().filter(CurveRow::has_values).collect();
        stored.sort_rows();
        stored.refresh_ranges();
        Ok(())
    }

    fn delete_rows(&self, log: &LogRef, range: &DeleteRange) -> Result<()> {
        let mut logs = self.logs.write();
        let stored = logs.get_mut(log).ok_or_else(|| missing(log))?;
        let columns = stored.columns(&range.mnemonics);

        let mut affected = Vec::new();
        for (position, row) in stored.rows.iter().enumerate() {
            if stored.in_range(&row.index, range.start.as_ref(), range.end.as_ref())? {
                affected.push(position);
            }
        }
        for position in affected {
            for &col in &columns {
                stored.rows[position].values[col].clear();
            }
        }

        stored.rows.retain(CurveRow::has_values);
        stored.refresh_ranges();
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for InMemoryStore {
    async fn get_log_header(&self, log: &LogRef) -> Result<LogHeader> {
        self.begin(StoreOp::GetHeader)?;
        self.header(log).ok_or_else(|| missing(log))
    }

    async fn get_log_data(&self, query: &DataQuery) -> Result<CurveBatch> {
        self.begin(StoreOp::GetData)?;
        self.query(query)
    }

    async fn add_log(&self, header: &LogHeader) -> Result<()> {
        self.begin(StoreOp::AddLog)?;
        self.insert_log(header)
    }

    async fn update_log_data(&self, log: &LogRef, data: &CurveBatch) -> Result<()> {
        self.begin(StoreOp::UpdateData)?;
        self.merge_rows(log, data)
    }

    async fn delete_log_data(&self, log: &LogRef, range: &DeleteRange) -> Result<()> {
        self.begin(StoreOp::DeleteData)?;
        self.delete_rows(log, range)
    }

    async fn delete_log(&self, log: &LogRef) -> Result<()> {
        self.begin(StoreOp::DeleteLog)?;
        self.logs
            .write()
            .remove(log)
            .map(|_| ())
            .ok_or_else(|| missing(log))
    }

    async fn capabilities(&self) -> Result<StoreCapabilities> {
        self.begin(StoreOp::Capabilities)?;
        Ok(self.capabilities.clone())
    }

    async fn list_wellbore_objects(&self, wellbore: &WellboreRef) -> Result<Vec<ObjectSummary>> {
        self.begin(StoreOp::ListObjects)?;
        let mut objects: Vec<ObjectSummary> = self
            .logs
            .read()
            .values()
            .filter(|s| s.header.log.wellbore() == *wellbore)
            .map(|s| ObjectSummary::new("log", s.header.log.uid.clone(), s.header.name.clone()))
            .collect();
        if let Some(registered) = self.objects.read().get(wellbore) {
            objects.extend(registered.iter().cloned());
        }
        objects.sort_by(|a, b| (&a.kind, &a.uid).cmp(&(&b.kind, &b.uid)));
        Ok(objects)
    }
}
