// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    decode_key, ClearValue, DecryptionDomain, EncryptedInput, EncryptedInputBuilder,
    EphemeralKeypair, Handle, RelayerError, UserDecryptAuthorization,
};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use zeroize::Zeroizing;

/// Plaintexts revealed by a user decryption, keyed by handle
pub type DecryptedValues = HashMap<Handle, U256>;

/// A ciphertext handle together with the contract it is scoped to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: Handle,
    pub contract_address: Address,
}

/// Everything the oracle needs to serve one user decryption.
///
/// The private key never leaves the client; it is used locally to open the
/// values the oracle seals to `public_key`.
#[derive(Clone)]
pub struct UserDecryptRequest {
    pub pairs: Vec<HandleContractPair>,
    pub private_key: Zeroizing<String>,
    pub public_key: String,
    /// Wallet signature without the `0x` marker
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl fmt::Debug for UserDecryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDecryptRequest")
            .field("pairs", &self.pairs)
            .field("public_key", &self.public_key)
            .field("contract_addresses", &self.contract_addresses)
            .field("user_address", &self.user_address)
            .field("start_timestamp", &self.start_timestamp)
            .field("duration_days", &self.duration_days)
            .finish_non_exhaustive()
    }
}

/// Capability of a confidential-computation protocol client: key generation,
/// authorization construction, encrypted inputs and user decryption.
#[async_trait]
pub trait ConfidentialClient: Send + Sync {
    /// Domain user decryption authorizations are signed under
    fn decryption_domain(&self) -> DecryptionDomain;

    /// Chain the ciphertexts live on
    fn chain_id(&self) -> u64;

    fn generate_keypair(&self) -> EphemeralKeypair {
        EphemeralKeypair::generate()
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<UserDecryptAuthorization, RelayerError> {
        let public_key = decode_key(public_key)?;
        Ok(UserDecryptAuthorization::new(
            &self.decryption_domain(),
            &public_key,
            contract_addresses,
            start_timestamp,
            duration_days,
        ))
    }

    /// Encrypt `values` for use by `contract` on behalf of `user`
    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError>;

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError>;
}

impl dyn ConfidentialClient + '_ {
    pub fn create_encrypted_input(
        &self,
        contract: Address,
        user: Address,
    ) -> EncryptedInputBuilder<'_> {
        EncryptedInputBuilder::new(self, contract, user)
    }
}

#[async_trait]
impl<T: ConfidentialClient + ?Sized> ConfidentialClient for Arc<T> {
    fn decryption_domain(&self) -> DecryptionDomain {
        (**self).decryption_domain()
    }

    fn chain_id(&self) -> u64 {
        (**self).chain_id()
    }

    fn generate_keypair(&self) -> EphemeralKeypair {
        (**self).generate_keypair()
    }

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Result<UserDecryptAuthorization, RelayerError> {
        (**self).create_eip712(public_key, contract_addresses, start_timestamp, duration_days)
    }

    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError> {
        (**self).encrypt_input(contract, user, values).await
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError> {
        (**self).user_decrypt(request).await
    }
}
