//! Bounded retry for remote fetches.
//!
//! Range fetches have no side effects on failure, so any transport error
//! can simply be reissued. Modeled as a generic wrapper rather than a loop
//! inside the store client so the policy (ceiling, backoff) lives in one
//! place and non-transport callers can share it.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Total attempts made before the last error is surfaced.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Invoke `op` up to `attempts` times, returning the first success.
///
/// Only errors with [`Error::is_retryable`](crate::error::Error::is_retryable)
/// are reissued; deterministic failures (bad layout, bad archive, bad key)
/// propagate immediately. Sleeps `500ms × attempt` between tries.
pub async fn with_retries<T, F, Fut>(attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    debug_assert!(attempts > 0);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, attempts, error = %e, "fetch failed, retrying");
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
