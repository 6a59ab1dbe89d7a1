// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    decode_key, seal,
    wire::{
        ErrorResponse, InputProofRequest, InputProofResponse, KeyUrlResponse, UserDecryptPayload,
        UserDecryptResponse, INPUT_PROOF_PATH, KEY_URL_PATH, USER_DECRYPT_PATH,
    },
    ClearValue, ConfidentialClient, DecryptedValues, DecryptionDomain, EncryptedInput,
    EphemeralKeypair, RelayerError, SealError, SealedValue, UserDecryptRequest, KEY_BYTE_SIZE,
};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// [`ConfidentialClient`] backed by a relayer reachable over HTTP
pub struct HttpRelayer {
    client: Client,
    base_url: String,
    chain_id: u64,
    domain: DecryptionDomain,
    relayer_key: OnceCell<[u8; KEY_BYTE_SIZE]>,
}

impl HttpRelayer {
    pub fn new(
        base_url: &str,
        chain_id: u64,
        domain: DecryptionDomain,
    ) -> Result<Self, RelayerError> {
        Self::with_timeout(base_url, chain_id, domain, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        chain_id: u64,
        domain: DecryptionDomain,
        timeout: Duration,
    ) -> Result<Self, RelayerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayerError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            chain_id,
            domain,
            relayer_key: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The relayer's sealing key, fetched once and cached
    pub async fn relayer_public_key(&self) -> Result<[u8; KEY_BYTE_SIZE], RelayerError> {
        let key = self
            .relayer_key
            .get_or_try_init(|| async {
                let response: KeyUrlResponse = self.get(KEY_URL_PATH).await?;
                debug!("fetched relayer key {}", response.public_key);
                Ok::<_, RelayerError>(decode_key(&response.public_key)?)
            })
            .await?;
        Ok(*key)
    }

    async fn get<Res: DeserializeOwned>(&self, path: &str) -> Result<Res, RelayerError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Res, RelayerError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn read<Res: DeserializeOwned>(response: reqwest::Response) -> Result<Res, RelayerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(RelayerError::Unavailable(format!("{}: {}", status, message)))
        } else {
            Err(RelayerError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl ConfidentialClient for HttpRelayer {
    fn decryption_domain(&self) -> DecryptionDomain {
        self.domain.clone()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[instrument(skip_all, fields(contract = %contract, values = values.len()))]
    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError> {
        let relayer_key = self.relayer_public_key().await?;
        let ciphertexts = values
            .iter()
            .map(|value| -> Result<String, RelayerError> {
                Ok(seal(&relayer_key, &value.to_bytes())?.to_hex())
            })
            .collect::<Result<Vec<_>, RelayerError>>()?;

        let request = InputProofRequest {
            contract_address: contract,
            user_address: user,
            contract_chain_id: self.chain_id,
            ciphertexts,
        };
        let response: InputProofResponse = self.post(INPUT_PROOF_PATH, &request).await?;

        if response.handles.len() != values.len() {
            return Err(RelayerError::MalformedResponse(format!(
                "expected {} handles, got {}",
                values.len(),
                response.handles.len()
            )));
        }

        info!("Encrypted {} values", values.len());
        Ok(EncryptedInput {
            handles: response.handles,
            input_proof: response.input_proof,
        })
    }

    #[instrument(skip_all, fields(user = %request.user_address, handles = request.pairs.len()))]
    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError> {
        let keypair = session_keypair(&request)?;
        let payload = UserDecryptPayload::from_request(&request, self.chain_id);

        let response: UserDecryptResponse = self.post(USER_DECRYPT_PATH, &payload).await?;
        open_shares(&keypair, &response)
    }
}

/// Rebuild the session keypair from a request and check both halves agree
pub fn session_keypair(request: &UserDecryptRequest) -> Result<EphemeralKeypair, RelayerError> {
    let keypair = EphemeralKeypair::from_private_key_hex(&request.private_key)?;
    if keypair.public_key_hex() != request.public_key.trim_start_matches("0x") {
        return Err(
            SealError::Malformed("private key does not match public key".to_string()).into(),
        );
    }
    Ok(keypair)
}

/// Open every share of a user decryption response with the session keypair
pub fn open_shares(
    keypair: &EphemeralKeypair,
    response: &UserDecryptResponse,
) -> Result<DecryptedValues, RelayerError> {
    response
        .response
        .iter()
        .map(|share| -> Result<_, RelayerError> {
            let sealed = SealedValue::from_hex(&share.sealed)?;
            let plaintext = keypair.open(&sealed)?;
            if plaintext.len() != 32 {
                return Err(RelayerError::MalformedResponse(format!(
                    "plaintext for {} is {} bytes",
                    share.handle,
                    plaintext.len()
                )));
            }
            Ok((share.handle, U256::from_be_slice(&plaintext)))
        })
        .collect()
}
