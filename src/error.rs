//! Error types for wellcurve
//!
//! Provides a unified error type for index arithmetic, store access and the
//! curve algorithms.

use thiserror::Error;

/// Result type alias using CurveError
pub type Result<T> = std::result::Result<T, CurveError>;

/// Unified error type for wellcurve operations
#[derive(Debug, Error)]
pub enum CurveError {
    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Index type mismatch: {0}")]
    TypeMismatch(String),

    // -------------------------------------------------------------------------
    // Input Errors (always reported before any I/O)
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Data error: {0}")]
    Data(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Communication failure: {0}")]
    Communication(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Job Errors
    // -------------------------------------------------------------------------
    #[error("Job cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // I/O and Serialization Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CurveError {
    /// True for failures of the communication layer that a single retry may absorb
    pub fn is_transient(&self) -> bool {
        matches!(self, CurveError::Timeout(_) | CurveError::Communication(_))
    }
}

impl From<serde_json::Error> for CurveError {
    fn from(e: serde_json::Error) -> Self {
        CurveError::Serialization(e.to_string())
    }
}
