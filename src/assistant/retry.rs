//! Bounded retry with a pluggable backoff

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts for the generative call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// `attempt × 1000 ms`, where `attempt` is the 1-based attempt that just failed
pub fn linear_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1000 * u64::from(attempt))
}

/// No delay between attempts
pub fn no_backoff(_attempt: u32) -> Duration {
    Duration::ZERO
}

/// Run `operation` up to `max_attempts` times, sleeping `backoff(n)` after
/// the n-th failure. Returns the last error once attempts run out.
///
/// `operation` receives the 1-based attempt number. A `max_attempts` of 0 is
/// treated as 1.
pub async fn retry_with_backoff<T, E, F, Fut, B>(max_attempts: u32, backoff: B, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(u32) -> Duration,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(err) => {
                let delay = backoff(attempt);
                warn!(
                    "Attempt {}/{} failed: {} - retrying in {}ms",
                    attempt,
                    max_attempts,
                    err,
                    delay.as_millis()
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
