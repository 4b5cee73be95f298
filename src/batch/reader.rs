//! Batch Reader
//!
//! Pulls curve data from a store in bounded batches.

use crate::config::Config;
use crate::error::{CurveError, Result};
use crate::index::{Direction, Index};
use crate::protocol::{decode_batch, CurveRowSet};
use crate::store::{DataQuery, LogHeader, LogRef, LogStore};

/// What to read: a curve subset over an index range
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    /// Data curves to read; empty reads every data curve
    pub mnemonics: Vec<String>,

    /// First index to read (`None` reads from the start of the log)
    pub start: Option<Index>,

    /// Whether `start` itself is part of the range
    pub inclusive_start: bool,

    /// Last index to read, inclusive (`None` reads to the end of the log)
    pub end: Option<Index>,
}

impl ReadRequest {
    /// Read the given curves over the whole log
    pub fn new(mnemonics: Vec<String>) -> Self {
        Self {
            mnemonics,
            start: None,
            inclusive_start: true,
            end: None,
        }
    }

    /// Read the given curves over `[start, end]`
    pub fn range(mnemonics: Vec<String>, start: Option<Index>, end: Option<Index>) -> Self {
        Self {
            mnemonics,
            start,
            inclusive_start: true,
            end,
        }
    }

    /// Skip the start index itself
    pub fn exclusive_start(mut self) -> Self {
        self.inclusive_start = false;
        self
    }
}

/// Lazy, finite sequence of row batches over one log
///
/// Each fetch asks for at most the negotiated number of rows; afterwards the
/// cursor moves one step past the last index so no row is returned twice.
/// The step is the store's depth precision when it advertises one, else the
/// finest step an index can take. Depth rows finer than the advertised
/// precision are rejected, as paging would skip their neighbours. The sequence ends at the first empty fetch. Errors from the store
/// are returned unchanged; the reader does not retry.
pub struct BatchReader<'a> {
    store: &'a dyn LogStore,
    log: LogRef,
    header: LogHeader,
    direction: Direction,
    /// Data columns in request order
    mnemonics: Vec<String>,
    cursor: Option<Index>,
    end: Option<Index>,
    /// Decimals the store keeps for depth values
    precision: Option<u32>,
    rows_per_batch: usize,
    batches_read: usize,
    finished: bool,
}

impl<'a> BatchReader<'a> {
    /// Negotiate batch size with the store and position the cursor
    pub async fn open(
        store: &'a dyn LogStore,
        header: &LogHeader,
        request: ReadRequest,
        config: &Config,
    ) -> Result<BatchReader<'a>> {
        let mnemonics = header.select_mnemonics(&request.mnemonics);
        let capabilities = store.capabilities().await?;
        let rows_per_batch =
            capabilities.rows_per_request(mnemonics.len() + 1, config.max_rows_per_request);

        let direction = header.direction;
        let precision = capabilities.depth_decimal_precision;
        let cursor = match request.start {
            Some(start) if !request.inclusive_start => {
                Some(start.advance_at_precision(direction, precision))
            }
            start => start,
        };

        // Nothing selected means nothing to read, not "every curve"
        let finished = mnemonics.is_empty();

        Ok(Self {
            store,
            log: header.log.clone(),
            header: header.clone(),
            direction,
            mnemonics,
            cursor,
            end: request.end,
            precision,
            rows_per_batch,
            batches_read: 0,
            finished,
        })
    }

    /// Fetch the next batch, or `None` once the range is exhausted
    pub async fn next_batch(&mut self) -> Result<Option<CurveRowSet>> {
        if self.finished {
            return Ok(None);
        }

        let query = DataQuery::new(self.log.clone(), self.mnemonics.clone())
            .start(self.cursor.clone())
            .end(self.end.clone())
            .max_rows(self.rows_per_batch);

        let batch = self.store.get_log_data(&query).await?;
        let decoded = decode_batch(&batch, self.header.index_type)?;

        let last = match decoded.last() {
            Some(row) => row.index.clone(),
            None => {
                self.finished = true;
                return Ok(None);
            }
        };

        if let Some(places) = self.precision {
            if let Some(row) = decoded.rows().iter().find(|r| r.index.decimal_places() > places) {
                return Err(CurveError::Data(format!(
                    "index {} of {} has more than the store's {} decimals",
                    row.index, self.log, places
                )));
            }
        }

        self.batches_read += 1;
        tracing::debug!(
            log = %self.log,
            batch = self.batches_read,
            rows = decoded.len(),
            last = %last,
            "Fetched curve batch"
        );

        self.cursor = Some(last.advance_at_precision(self.direction, self.precision));

        let mut set = self.empty_set();
        set.append(decoded);
        Ok(Some(set))
    }

    /// Drain the remaining batches into one row set
    pub async fn read_all(mut self) -> Result<CurveRowSet> {
        let mut all = self.empty_set();
        while let Some(batch) = self.next_batch().await? {
            all.append(batch);
        }
        Ok(all)
    }

    /// Data columns this reader returns, in order
    pub fn mnemonics(&self) -> &[String] {
        &self.mnemonics
    }

    /// Rows requested per fetch
    pub fn rows_per_batch(&self) -> usize {
        self.rows_per_batch
    }

    pub fn batches_read(&self) -> usize {
        self.batches_read
    }

    fn empty_set(&self) -> CurveRowSet {
        CurveRowSet::for_header(&self.header, &self.mnemonics)
    }
}

/// Read the given curves of a log over `[start, end]` in one call
pub async fn read_range(
    store: &dyn LogStore,
    header: &LogHeader,
    mnemonics: Vec<String>,
    start: Option<Index>,
    end: Option<Index>,
    config: &Config,
) -> Result<CurveRowSet> {
    BatchReader::open(store, header, ReadRequest::range(mnemonics, start, end), config)
        .await?
        .read_all()
        .await
}
