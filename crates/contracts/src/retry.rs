// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::rpc::types::TransactionReceipt;
use purechance_utils::{retry_with_backoff, RetryError};
use std::future::Future;
use tracing::info;

const RETRY_MAX_ATTEMPTS: u32 = 3;
const RETRY_INITIAL_DELAY_MS: u64 = 2000;

fn should_retry_error(error: &str, retry_on_errors: &[&str]) -> bool {
    if retry_on_errors.is_empty() {
        return true;
    }
    let error = error.to_lowercase();
    retry_on_errors.iter().any(|code| error.contains(code))
}

/// Send a transaction, resending it when the error text matches one of
/// `retry_on_errors` (any error when the list is empty).
pub async fn send_tx_with_retry<F, Fut>(
    operation_name: &str,
    retry_on_errors: &[&str],
    tx_fn: F,
) -> eyre::Result<TransactionReceipt>
where
    F: Fn() -> Fut,
    Fut: Future<Output = eyre::Result<TransactionReceipt>>,
{
    retry_with_backoff(
        || {
            let fut = tx_fn();
            async move {
                match fut.await {
                    Ok(receipt) => Ok(receipt),
                    Err(e) => {
                        if should_retry_error(&e.to_string(), retry_on_errors) {
                            info!("{}: error, will retry: {}", operation_name, e);
                            Err(RetryError::Retry(e))
                        } else {
                            Err(RetryError::Failure(e))
                        }
                    }
                }
            }
        },
        RETRY_MAX_ATTEMPTS,
        RETRY_INITIAL_DELAY_MS,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_error() {
        assert!(should_retry_error("anything", &[]));
        assert!(should_retry_error(
            "server returned: Nonce too low",
            &["nonce too low"]
        ));
        assert!(!should_retry_error(
            "execution reverted: ZamaProtocolUnsupported",
            &["nonce too low", "timed out"]
        ));
    }
}
