// src/error_recovery.rs
//! Fixed-delay retry for API operations.

use crate::constants::{RETRY_DELAY, RETRY_MAX_ATTEMPTS};
use crate::error::AppError;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Same attempt budget, no pause. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RETRY_MAX_ATTEMPTS, RETRY_DELAY)
    }
}

/// Retries an async operation with a fixed delay between attempts.
///
/// Every error is retried. After the last attempt the error from that
/// attempt is returned unchanged.
pub async fn retry_with_policy<F, T, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    log::debug!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt >= max_attempts => {
                log::error!("All {} attempts failed: {}", max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                log::warn!(
                    "Attempt {}/{} failed, retrying after {:?}: {}",
                    attempt,
                    max_attempts,
                    policy.delay,
                    e
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
