// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptError, DecryptionConfig, WalletConnection, WalletError};
use alloy::primitives::Address;
use purechance_fhevm::{
    strip_hex_marker, ConfidentialClient, DecryptedValues, Handle, HandleContractPair,
    UserDecryptRequest, USER_DECRYPT_DURATION_DAYS,
};
use purechance_utils::{retry_with_backoff, unix_now, RetryError};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Turns a set of handles scoped to one contract into plaintexts, on behalf
/// of the account connected to `wallet`.
pub struct UserDecryptor {
    client: Arc<dyn ConfidentialClient>,
    wallet: Arc<dyn WalletConnection>,
    config: DecryptionConfig,
}

impl UserDecryptor {
    pub fn new(
        client: Arc<dyn ConfidentialClient>,
        wallet: Arc<dyn WalletConnection>,
        config: DecryptionConfig,
    ) -> Self {
        Self {
            client,
            wallet,
            config,
        }
    }

    pub fn client(&self) -> &Arc<dyn ConfidentialClient> {
        &self.client
    }

    pub fn wallet(&self) -> &Arc<dyn WalletConnection> {
        &self.wallet
    }

    pub fn config(&self) -> &DecryptionConfig {
        &self.config
    }

    /// Decrypt `handles` for `user`.
    ///
    /// On success the mapping holds exactly the requested handles. Nothing
    /// reaches the wallet or the oracle when the list is empty or contains
    /// the all-zero handle, and nothing reaches the oracle unless the wallet
    /// produced a signature.
    #[instrument(skip_all, fields(user = %user, contract = %contract, handles = handles.len()))]
    pub async fn decrypt(
        &self,
        user: Address,
        contract: Address,
        handles: &[Handle],
    ) -> Result<DecryptedValues, DecryptError> {
        if handles.is_empty() {
            return Ok(DecryptedValues::new());
        }
        if let Some(handle) = handles.iter().find(|h| h.is_zero()) {
            return Err(DecryptError::InvalidHandle(*handle));
        }

        let signer = match timeout(self.config.signer_timeout(), self.wallet.signer()).await {
            Err(_) => {
                return Err(DecryptError::SignerUnavailable(format!(
                    "wallet did not respond within {}s",
                    self.config.signer_timeout
                )))
            }
            Ok(Err(e)) => return Err(DecryptError::SignerUnavailable(e.to_string())),
            Ok(Ok(None)) => {
                return Err(DecryptError::SignerUnavailable(
                    "no wallet connected".to_string(),
                ))
            }
            Ok(Ok(Some(signer))) => signer,
        };
        if signer.address() != user {
            return Err(DecryptError::SignerUnavailable(format!(
                "connected account {} is not {}",
                signer.address(),
                user
            )));
        }

        let keypair = self.client.generate_keypair();
        let start_timestamp = unix_now().map_err(|e| DecryptError::Internal(e.to_string()))?;
        let contract_addresses = vec![contract];
        let authorization = self
            .client
            .create_eip712(
                &keypair.public_key_hex(),
                &contract_addresses,
                start_timestamp,
                USER_DECRYPT_DURATION_DAYS,
            )
            .map_err(|e| DecryptError::Internal(e.to_string()))?;

        debug!("Requesting signature over decryption authorization");
        let signature = match timeout(
            self.config.signature_timeout(),
            signer.sign_authorization(&authorization),
        )
        .await
        {
            Err(_) => return Err(DecryptError::SignatureTimeout(self.config.signature_timeout)),
            Ok(Err(WalletError::Declined(reason))) => {
                info!("User declined decryption: {}", reason);
                return Err(DecryptError::UserDeclined);
            }
            Ok(Err(WalletError::Unavailable(reason))) => {
                return Err(DecryptError::SignerUnavailable(reason))
            }
            Ok(Ok(signature)) => signature,
        };

        let request = UserDecryptRequest {
            pairs: handles
                .iter()
                .map(|handle| HandleContractPair {
                    handle: *handle,
                    contract_address: contract,
                })
                .collect(),
            private_key: keypair.private_key_hex(),
            public_key: keypair.public_key_hex(),
            signature: strip_hex_marker(&signature).to_string(),
            contract_addresses,
            user_address: user,
            start_timestamp,
            duration_days: USER_DECRYPT_DURATION_DAYS,
        };

        let mut values = self.submit(request).await?;

        let mut result = DecryptedValues::with_capacity(handles.len());
        for handle in handles {
            let value = values
                .remove(handle)
                .or_else(|| result.get(handle).copied())
                .ok_or(DecryptError::OracleIncomplete(*handle))?;
            result.insert(*handle, value);
        }
        if !values.is_empty() {
            debug!("Dropping {} values that were not requested", values.len());
        }

        info!("Decrypted {} handles", result.len());
        Ok(result)
    }

    /// Send the request to the oracle, retrying transient failures with the
    /// same signature.
    async fn submit(&self, request: UserDecryptRequest) -> Result<DecryptedValues, DecryptError> {
        let oracle_timeout = self.config.oracle_timeout();
        let timeout_secs = self.config.oracle_timeout;
        let client = &self.client;
        let request = &request;

        retry_with_backoff(
            || async move {
                match timeout(oracle_timeout, client.user_decrypt(request.clone())).await {
                    Err(_) => {
                        warn!("Decryption oracle timed out after {}s", timeout_secs);
                        Err(RetryError::Retry(DecryptError::OracleTimeout(timeout_secs)))
                    }
                    Ok(Err(e)) if e.is_transient() => Err(RetryError::Retry(e.into())),
                    Ok(Err(e)) => Err(RetryError::Failure(e.into())),
                    Ok(Ok(values)) => Ok(values),
                }
            },
            self.config.oracle_attempts.max(1),
            self.config.retry_delay_ms,
        )
        .await
    }
}
