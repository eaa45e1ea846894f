//! Exponential-backoff retry and deadlines for upstream calls

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};

/// Run `operation` up to `max_retries + 1` times, sleeping 1s, 2s, 4s... between attempts.
///
/// Input errors are returned immediately since repeating the call cannot help.
pub async fn retry_request<F, Fut, T>(max_retries: u32, what: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e @ Error::InvalidInput(_)) => return Err(e),
            Err(e) => {
                if attempt < max_retries {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal(format!("{} failed", what))))
}

/// Bound an upstream call by `limit`, mapping expiry to [`Error::Timeout`]
pub async fn with_timeout<Fut, T>(limit: Duration, what: &str, operation: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("{} exceeded {:?}", what, limit);
            Err(Error::Timeout(format!("{} exceeded {:?}", what, limit)))
        }
    }
}
