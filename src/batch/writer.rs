//! Batch Writer
//!
//! Pushes curve data to a store in bounded chunks.

use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{encode_rows, CurveRowSet};
use crate::store::{DeleteRange, LogRef, LogStore, StoreCapabilities};

use super::with_retry;

/// Writes row sets to one log
///
/// Every chunk, and every delete, goes through [`with_retry`].
pub struct BatchWriter<'a> {
    store: &'a dyn LogStore,
    log: LogRef,
    capabilities: StoreCapabilities,
    max_rows_per_request: usize,
    retry_delay: Duration,
}

impl<'a> BatchWriter<'a> {
    /// Negotiate chunk limits with the store
    pub async fn open(store: &'a dyn LogStore, log: LogRef, config: &Config) -> Result<BatchWriter<'a>> {
        let capabilities = store.capabilities().await?;
        Ok(Self {
            store,
            log,
            capabilities,
            max_rows_per_request: config.max_rows_per_request,
            retry_delay: config.retry_delay,
        })
    }

    /// Rows per chunk for a set with this many data columns
    pub fn chunk_rows(&self, data_columns: usize) -> usize {
        self.capabilities
            .rows_per_request(data_columns + 1, self.max_rows_per_request)
    }

    /// Write every row of `rows`, returning the number of rows written
    pub async fn write(&self, rows: &CurveRowSet) -> Result<usize> {
        self.write_with_progress(rows, |_, _| {}).await
    }

    /// Write every row, calling `progress(written, total)` after each chunk
    pub async fn write_with_progress<P>(&self, rows: &CurveRowSet, mut progress: P) -> Result<usize>
    where
        P: FnMut(usize, usize),
    {
        let total = rows.len();
        let chunk_rows = self.chunk_rows(rows.mnemonics().len());
        let store = self.store;
        let log = &self.log;

        let mut written = 0;
        for chunk in rows.rows().chunks(chunk_rows) {
            let batch = encode_rows(rows, chunk);
            let batch = &batch;
            with_retry(self.retry_delay, "update_log_data", move || {
                store.update_log_data(log, batch)
            })
            .await?;

            written += chunk.len();
            tracing::debug!(log = %self.log, written, total, "Wrote curve chunk");
            progress(written, total);
        }

        Ok(written)
    }

    /// Delete a range of values
    pub async fn delete(&self, range: &DeleteRange) -> Result<()> {
        let store = self.store;
        let log = &self.log;
        with_retry(self.retry_delay, "delete_log_data", move || {
            store.delete_log_data(log, range)
        })
        .await
    }

    pub fn log(&self) -> &LogRef {
        &self.log
    }
}
