// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ConfidentialClient, FheType, Handle, RelayerError};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total plaintext bits a single encrypted input may carry
pub const MAX_INPUT_BITS: usize = 2048;
const SIGNATURE_BYTE_SIZE: usize = 65;

/// A plaintext waiting to be encrypted, tagged with its target type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearValue {
    #[serde(rename = "type")]
    pub fhe_type: FheType,
    pub value: U256,
}

impl ClearValue {
    pub fn new(fhe_type: FheType, value: U256) -> Self {
        Self { fhe_type, value }
    }

    /// `[tag][32 byte big endian value]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(33);
        out.push(self.fhe_type.tag());
        out.extend_from_slice(&self.value.to_be_bytes::<32>());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RelayerError> {
        if bytes.len() != 33 {
            return Err(RelayerError::InvalidInputProof(format!(
                "clear value must be 33 bytes, got {}",
                bytes.len()
            )));
        }
        let fhe_type = FheType::from_tag(bytes[0]).ok_or_else(|| {
            RelayerError::InvalidInputProof(format!("unknown type tag {}", bytes[0]))
        })?;
        let value = U256::from_be_slice(&bytes[1..]);
        if value > fhe_type.max_value() {
            return Err(RelayerError::InvalidInputProof(format!(
                "value does not fit in {}",
                fhe_type
            )));
        }
        Ok(Self { fhe_type, value })
    }
}

impl FheType {
    /// Wrap a plain value into a [`ClearValue`] of this type
    pub fn clear(self, value: u64) -> ClearValue {
        ClearValue::new(self, U256::from(value))
    }
}

/// Handles for freshly encrypted values plus the proof a contract needs to
/// accept them.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handles: Vec<Handle>,
    pub input_proof: Bytes,
}

impl fmt::Debug for EncryptedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedInput")
            .field("handles", &self.handles)
            .field("input_proof_len", &self.input_proof.len())
            .finish()
    }
}

/// Digest an input proof signature commits to
pub fn input_proof_digest(contract: Address, user: Address, handles: &[Handle]) -> B256 {
    let mut preimage = Vec::with_capacity(40 + handles.len() * 32);
    preimage.extend_from_slice(contract.as_slice());
    preimage.extend_from_slice(user.as_slice());
    for handle in handles {
        preimage.extend_from_slice(handle.as_b256().as_slice());
    }
    keccak256(preimage)
}

/// Pack an input proof: `[count][handles..][signature (65)]`
pub fn encode_input_proof(handles: &[Handle], signature: &[u8; SIGNATURE_BYTE_SIZE]) -> Bytes {
    let mut out = Vec::with_capacity(1 + handles.len() * 32 + SIGNATURE_BYTE_SIZE);
    out.push(handles.len() as u8);
    for handle in handles {
        out.extend_from_slice(handle.as_b256().as_slice());
    }
    out.extend_from_slice(signature);
    Bytes::from(out)
}

/// Unpack an input proof into its handles and signature bytes
pub fn decode_input_proof(proof: &[u8]) -> Result<(Vec<Handle>, Vec<u8>), RelayerError> {
    let Some((&count, rest)) = proof.split_first() else {
        return Err(RelayerError::InvalidInputProof("empty proof".to_string()));
    };
    let count = count as usize;
    if rest.len() != count * 32 + SIGNATURE_BYTE_SIZE {
        return Err(RelayerError::InvalidInputProof(format!(
            "expected {} bytes after count, got {}",
            count * 32 + SIGNATURE_BYTE_SIZE,
            rest.len()
        )));
    }
    let handles = rest[..count * 32]
        .chunks_exact(32)
        .map(|chunk| Handle::new(B256::from_slice(chunk)))
        .collect();
    Ok((handles, rest[count * 32..].to_vec()))
}

/// Collects typed plaintexts for one (contract, user) pair and turns them into
/// an [`EncryptedInput`] through a [`ConfidentialClient`].
pub struct EncryptedInputBuilder<'a> {
    client: &'a dyn ConfidentialClient,
    contract: Address,
    user: Address,
    values: Vec<ClearValue>,
}

impl<'a> EncryptedInputBuilder<'a> {
    pub fn new(client: &'a dyn ConfidentialClient, contract: Address, user: Address) -> Self {
        Self {
            client,
            contract,
            user,
            values: vec![],
        }
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.push(FheType::Bool, U256::from(value as u8))
    }

    pub fn add8(&mut self, value: u8) -> &mut Self {
        self.push(FheType::Uint8, U256::from(value))
    }

    pub fn add16(&mut self, value: u16) -> &mut Self {
        self.push(FheType::Uint16, U256::from(value))
    }

    pub fn add32(&mut self, value: u32) -> &mut Self {
        self.push(FheType::Uint32, U256::from(value))
    }

    pub fn add64(&mut self, value: u64) -> &mut Self {
        self.push(FheType::Uint64, U256::from(value))
    }

    fn push(&mut self, fhe_type: FheType, value: U256) -> &mut Self {
        self.values.push(ClearValue::new(fhe_type, value));
        self
    }

    pub fn bits(&self) -> usize {
        self.values.iter().map(|v| v.fhe_type.bits()).sum()
    }

    pub async fn encrypt(&self) -> Result<EncryptedInput, RelayerError> {
        let bits = self.bits();
        if bits > MAX_INPUT_BITS {
            return Err(RelayerError::InputTooLarge {
                bits,
                max: MAX_INPUT_BITS,
            });
        }
        self.client
            .encrypt_input(self.contract, self.user, &self.values)
            .await
    }
}
