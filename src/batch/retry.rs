//! Single retry with fixed back-off
//!
//! Absorbs one transient communication fault per write without amplifying
//! load on the store.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Run `operation`, retrying exactly once after `delay` on a transient failure
///
/// Only `Timeout` and `Communication` failures are retried. Any other
/// failure, and the outcome of the retry, are returned as is. The delay is
/// not interrupted by cancellation.
pub async fn with_retry<T, F, Fut>(delay: Duration, name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match operation().await {
        Err(e) if e.is_transient() => {
            tracing::warn!(
                operation = name,
                error = %e,
                delay_secs = delay.as_secs(),
                "Transient failure, retrying once"
            );
            tokio::time::sleep(delay).await;
            operation().await
        }
        outcome => outcome,
    }
}
