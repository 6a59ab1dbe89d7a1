// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! JSON bodies exchanged with the relayer.

use crate::{Handle, HandleContractPair, UserDecryptRequest};
use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

pub const KEY_URL_PATH: &str = "/v1/keyurl";
pub const INPUT_PROOF_PATH: &str = "/v1/input-proof";
pub const USER_DECRYPT_PATH: &str = "/v1/user-decrypt";
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUrlResponse {
    /// Hex encoded X25519 key values are sealed to before they reach the relayer
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputProofRequest {
    pub contract_address: Address,
    pub user_address: Address,
    pub contract_chain_id: u64,
    /// Hex encoded sealed values, one per plaintext
    pub ciphertexts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputProofResponse {
    pub handles: Vec<Handle>,
    pub input_proof: Bytes,
}

/// Timestamps travel as decimal strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestValidity {
    pub start_timestamp: String,
    pub duration_days: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptPayload {
    pub handle_contract_pairs: Vec<HandleContractPair>,
    pub request_validity: RequestValidity,
    pub contracts_chain_id: u64,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub signature: String,
    pub public_key: String,
    #[serde(default)]
    pub extra_data: String,
}

impl UserDecryptPayload {
    pub fn from_request(request: &UserDecryptRequest, contracts_chain_id: u64) -> Self {
        Self {
            handle_contract_pairs: request.pairs.clone(),
            request_validity: RequestValidity {
                start_timestamp: request.start_timestamp.to_string(),
                duration_days: request.duration_days.to_string(),
            },
            contracts_chain_id,
            contract_addresses: request.contract_addresses.clone(),
            user_address: request.user_address,
            signature: request.signature.clone(),
            public_key: request.public_key.clone(),
            extra_data: "00".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDecryptShare {
    pub handle: Handle,
    /// Hex encoded value sealed to the request's public key
    pub sealed: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDecryptResponse {
    pub response: Vec<UserDecryptShare>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
