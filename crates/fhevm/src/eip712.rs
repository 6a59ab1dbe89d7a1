// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::RelayerError;
use alloy::{
    primitives::{Address, Bytes, Signature, B256, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use purechance_utils::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Fixed validity window of a user decryption authorization
pub const USER_DECRYPT_DURATION_DAYS: u64 = 7;
/// Upper bound the oracle accepts for any authorization
pub const MAX_USER_DECRYPT_DURATION_DAYS: u64 = 365;
pub const DECRYPTION_DOMAIN_NAME: &str = "Decryption";
pub const DECRYPTION_DOMAIN_VERSION: &str = "1";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
        bytes extraData;
    }
}

/// Where user decryption authorizations are verified: the gateway chain and
/// its decryption contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionDomain {
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl DecryptionDomain {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            chain_id,
            verifying_contract,
        }
    }

    pub fn eip712_domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Borrowed(DECRYPTION_DOMAIN_NAME)),
            Some(Cow::Borrowed(DECRYPTION_DOMAIN_VERSION)),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

/// Typed statement allowing the holder of an ephemeral public key to decrypt
/// ciphertexts scoped to a set of contracts for a bounded time window.
#[derive(Clone, Debug)]
pub struct UserDecryptAuthorization {
    domain: Eip712Domain,
    message: UserDecryptRequestVerification,
}

impl UserDecryptAuthorization {
    pub fn new(
        domain: &DecryptionDomain,
        public_key: &[u8],
        contract_addresses: &[Address],
        start_timestamp: u64,
        duration_days: u64,
    ) -> Self {
        Self {
            domain: domain.eip712_domain(),
            message: UserDecryptRequestVerification {
                publicKey: Bytes::copy_from_slice(public_key),
                contractAddresses: contract_addresses.to_vec(),
                startTimestamp: U256::from(start_timestamp),
                durationDays: U256::from(duration_days),
                extraData: Bytes::new(),
            },
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn message(&self) -> &UserDecryptRequestVerification {
        &self.message
    }

    /// The EIP-712 digest a wallet signs
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    pub fn start_timestamp(&self) -> u64 {
        u64::try_from(self.message.startTimestamp).unwrap_or(u64::MAX)
    }

    pub fn duration_days(&self) -> u64 {
        u64::try_from(self.message.durationDays).unwrap_or(u64::MAX)
    }

    pub fn expires_at(&self) -> u64 {
        self.start_timestamp()
            .saturating_add(self.duration_days().saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        self.start_timestamp() <= now && now < self.expires_at()
    }

    /// Recover the address that produced `signature` over this authorization.
    ///
    /// Accepts the signature with or without the leading `0x` marker.
    pub fn recover_signer(&self, signature: &str) -> Result<Address, RelayerError> {
        let bytes = hex::decode(strip_hex_marker(signature))
            .map_err(|e| RelayerError::InvalidSignature(e.to_string()))?;
        let signature = Signature::try_from(bytes.as_slice())
            .map_err(|e| RelayerError::InvalidSignature(e.to_string()))?;
        signature
            .recover_address_from_prehash(&self.signing_hash())
            .map_err(|e| RelayerError::InvalidSignature(e.to_string()))
    }
}

/// Remove the `0x` protocol marker wallets put in front of hex signatures
pub fn strip_hex_marker(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}
