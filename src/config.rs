//! Configuration for wellcurve
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for the curve algorithms
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Write Configuration
    // -------------------------------------------------------------------------
    /// Fixed delay before the single retry of a failed write
    pub retry_delay: Duration,

    /// Name fragment of the temporary log created before an offset
    /// Backup uid: {log_uid}-{backup_suffix}-{unix_millis}
    pub backup_suffix: String,

    // -------------------------------------------------------------------------
    // Read Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on rows per request, applied on top of the store's
    /// advertised capabilities
    pub max_rows_per_request: usize,

    // -------------------------------------------------------------------------
    // Comparison Configuration
    // -------------------------------------------------------------------------
    /// Global number of mismatches after which a comparison stops
    pub mismatch_cap: usize,

    /// Number of curves compared concurrently per wave
    pub compare_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(60),
            backup_suffix: "offset-backup".to_string(),
            max_rows_per_request: 10_000,
            mismatch_cap: 10_000,
            compare_concurrency: 8,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the delay before a write is retried
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the backup log name fragment
    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.backup_suffix = suffix.into();
        self
    }

    /// Set the client-side row limit per request
    pub fn max_rows_per_request(mut self, rows: usize) -> Self {
        self.config.max_rows_per_request = rows.max(1);
        self
    }

    /// Set the comparison mismatch cap
    pub fn mismatch_cap(mut self, cap: usize) -> Self {
        self.config.mismatch_cap = cap;
        self
    }

    /// Set how many curves are compared at once
    pub fn compare_concurrency(mut self, count: usize) -> Self {
        self.config.compare_concurrency = count.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
