// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

/// Outcome of a single attempt handed back to [`retry_with_backoff`].
pub enum RetryError<E> {
    /// Give up immediately and hand the error to the caller
    Failure(E),
    /// Try again after the current backoff delay
    Retry(E),
}

pub fn to_retry<E>(e: impl Into<E>) -> RetryError<E> {
    RetryError::Retry(e.into())
}

pub fn to_failure<E>(e: impl Into<E>) -> RetryError<E> {
    RetryError::Failure(e.into())
}

pub const BACKOFF_DELAY: u64 = 500;
pub const BACKOFF_MAX_RETRIES: u32 = 3;

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - Async function to retry
/// * `max_attempts` - Maximum number of attempts including the first one
/// * `initial_delay_ms` - Initial delay between retries in milliseconds
///
/// # Returns
/// * `Ok(T)` as soon as one attempt succeeds, otherwise the last error seen
pub async fn retry_with_backoff<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    initial_delay_ms: u64,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let mut current_attempt = 1;
    let mut delay_ms = initial_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Retry(e)) => {
                if current_attempt >= max_attempts {
                    error!(
                        "Operation failed after {} attempts. Last error: {}",
                        max_attempts, e
                    );
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    current_attempt, max_attempts, delay_ms, e
                );

                sleep(Duration::from_millis(delay_ms)).await;
                current_attempt += 1;
                delay_ms *= 2; // Exponential backoff
            }
            Err(RetryError::Failure(e)) => {
                error!("FAILURE!: returning to caller: {}", e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<u32, String> = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(to_retry(format!("attempt {n}")))
                    } else {
                        Ok(n)
                    }
                }
            },
            5,
            1,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), String> = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(to_failure("nope"))
                }
            },
            5,
            1,
        )
        .await;

        assert_eq!(result, Err("nope".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), String> = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(to_retry("still down"))
                }
            },
            3,
            1,
        )
        .await;

        assert_eq!(result, Err("still down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
