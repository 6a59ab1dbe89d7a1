// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! In-process decryption oracle.
//!
//! Holds plaintexts behind handles, an access list per handle and a signing
//! key for input proofs. It backs the local relayer server and the test
//! doubles, and can be used directly as a [`ConfidentialClient`].

use crate::{
    decode_input_proof, decode_key, encode_input_proof, input_proof_digest,
    relayer::{open_shares, session_keypair},
    seal,
    wire::{
        InputProofRequest, InputProofResponse, UserDecryptPayload, UserDecryptResponse,
        UserDecryptShare,
    },
    ClearValue, ConfidentialClient, DecryptedValues, DecryptionDomain, EncryptedInput,
    EphemeralKeypair, Handle, RelayerError, SealedValue, UserDecryptAuthorization,
    UserDecryptRequest, MAX_USER_DECRYPT_DURATION_DAYS,
};
use alloy::{
    primitives::{keccak256, Address, Signature},
    signers::{local::PrivateKeySigner, SignerSync},
};
use async_trait::async_trait;
use purechance_utils::unix_now;
use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

#[derive(Default)]
struct OracleState {
    values: HashMap<Handle, ClearValue>,
    acl: HashMap<Handle, HashSet<Address>>,
    nonce: u64,
    input_proof_calls: usize,
    user_decrypt_calls: usize,
}

pub struct LocalOracle {
    chain_id: u64,
    domain: DecryptionDomain,
    sealing_key: EphemeralKeypair,
    proof_signer: PrivateKeySigner,
    state: Mutex<OracleState>,
}

impl LocalOracle {
    pub fn new(chain_id: u64, domain: DecryptionDomain) -> Self {
        Self::with_keys(
            chain_id,
            domain,
            EphemeralKeypair::generate(),
            PrivateKeySigner::random(),
        )
    }

    pub fn with_keys(
        chain_id: u64,
        domain: DecryptionDomain,
        sealing_key: EphemeralKeypair,
        proof_signer: PrivateKeySigner,
    ) -> Self {
        Self {
            chain_id,
            domain,
            sealing_key,
            proof_signer,
            state: Mutex::new(OracleState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, OracleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hex encoded key clients seal input values to
    pub fn public_key_hex(&self) -> String {
        self.sealing_key.public_key_hex()
    }

    /// Address whose signature makes an input proof valid
    pub fn proof_signer_address(&self) -> Address {
        self.proof_signer.address()
    }

    /// Store a plaintext produced on-chain and return a fresh handle for it.
    /// Nobody is allowed to decrypt it until [`LocalOracle::allow`] is called.
    pub fn trivial_encrypt(&self, value: ClearValue) -> Handle {
        let mut state = self.state();
        state.nonce += 1;
        let mut seed = b"computed".to_vec();
        seed.extend_from_slice(&state.nonce.to_be_bytes());
        let handle = Handle::compose(keccak256(seed), 0, self.chain_id, value.fhe_type);
        state.values.insert(handle, value);
        handle
    }

    pub fn allow(&self, handle: Handle, account: Address) {
        self.state().acl.entry(handle).or_default().insert(account);
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.state()
            .acl
            .get(handle)
            .is_some_and(|accounts| accounts.contains(account))
    }

    pub fn plaintext(&self, handle: &Handle) -> Option<ClearValue> {
        self.state().values.get(handle).copied()
    }

    pub fn input_proof_calls(&self) -> usize {
        self.state().input_proof_calls
    }

    pub fn user_decrypt_calls(&self) -> usize {
        self.state().user_decrypt_calls
    }

    /// Check that `proof` was issued by this oracle for exactly `handles`,
    /// bound to `contract` and `user`.
    pub fn verify_input_proof(
        &self,
        contract: Address,
        user: Address,
        handles: &[Handle],
        proof: &[u8],
    ) -> Result<(), RelayerError> {
        let (proven, signature) = decode_input_proof(proof)?;
        if proven != handles {
            return Err(RelayerError::InvalidInputProof(
                "handles do not match the proof".to_string(),
            ));
        }
        let signature = Signature::try_from(signature.as_slice())
            .map_err(|e| RelayerError::InvalidInputProof(e.to_string()))?;
        let signer = signature
            .recover_address_from_prehash(&input_proof_digest(contract, user, handles))
            .map_err(|e| RelayerError::InvalidInputProof(e.to_string()))?;
        if signer != self.proof_signer.address() {
            return Err(RelayerError::InvalidInputProof(format!(
                "proof signed by unknown key {}",
                signer
            )));
        }
        if handles.iter().any(|h| !self.state().values.contains_key(h)) {
            return Err(RelayerError::InvalidInputProof(
                "proof references unknown handles".to_string(),
            ));
        }
        Ok(())
    }

    pub fn serve_input_proof(
        &self,
        request: &InputProofRequest,
    ) -> Result<InputProofResponse, RelayerError> {
        if request.contract_chain_id != self.chain_id {
            return Err(RelayerError::Rejected {
                status: 400,
                message: format!("unsupported chain {}", request.contract_chain_id),
            });
        }
        if request.ciphertexts.is_empty() || request.ciphertexts.len() > u8::MAX as usize {
            return Err(RelayerError::InvalidInputProof(format!(
                "cannot prove {} values",
                request.ciphertexts.len()
            )));
        }

        let values = request
            .ciphertexts
            .iter()
            .map(|ciphertext| -> Result<ClearValue, RelayerError> {
                let sealed = SealedValue::from_hex(ciphertext)?;
                ClearValue::from_bytes(&self.sealing_key.open(&sealed)?)
            })
            .collect::<Result<Vec<_>, RelayerError>>()?;

        let handles = {
            let mut state = self.state();
            state.input_proof_calls += 1;
            state.nonce += 1;
            let mut seed = Vec::with_capacity(48);
            seed.extend_from_slice(request.contract_address.as_slice());
            seed.extend_from_slice(request.user_address.as_slice());
            seed.extend_from_slice(&state.nonce.to_be_bytes());
            let digest = keccak256(seed);

            values
                .iter()
                .enumerate()
                .map(|(index, value)| {
                    let handle =
                        Handle::compose(digest, index as u8, self.chain_id, value.fhe_type);
                    state.values.insert(handle, *value);
                    handle
                })
                .collect::<Vec<_>>()
        };

        let digest =
            input_proof_digest(request.contract_address, request.user_address, &handles);
        let signature = self
            .proof_signer
            .sign_hash_sync(&digest)
            .map_err(|e| RelayerError::Unavailable(e.to_string()))?;

        debug!("Issued input proof for {} handles", handles.len());
        Ok(InputProofResponse {
            input_proof: encode_input_proof(&handles, &signature.as_bytes()),
            handles,
        })
    }

    /// Check a user decryption payload against the signature, its validity
    /// window and the access list, then seal every plaintext to the
    /// payload's public key.
    pub fn serve_user_decrypt(
        &self,
        payload: &UserDecryptPayload,
    ) -> Result<UserDecryptResponse, RelayerError> {
        self.state().user_decrypt_calls += 1;

        if payload.contracts_chain_id != self.chain_id {
            return Err(RelayerError::Rejected {
                status: 400,
                message: format!("unsupported chain {}", payload.contracts_chain_id),
            });
        }
        if payload.handle_contract_pairs.is_empty() {
            return Err(RelayerError::Rejected {
                status: 400,
                message: "no handles requested".to_string(),
            });
        }
        if let Some(pair) = payload
            .handle_contract_pairs
            .iter()
            .find(|pair| !payload.contract_addresses.contains(&pair.contract_address))
        {
            return Err(RelayerError::Rejected {
                status: 400,
                message: format!("contract {} is not covered by the request", pair.contract_address),
            });
        }

        let start = parse_decimal(&payload.request_validity.start_timestamp, "startTimestamp")?;
        let days = parse_decimal(&payload.request_validity.duration_days, "durationDays")?;
        if days == 0 || days > MAX_USER_DECRYPT_DURATION_DAYS {
            return Err(RelayerError::Rejected {
                status: 400,
                message: format!("duration of {} days is out of range", days),
            });
        }

        let public_key = decode_key(&payload.public_key)?;
        let authorization = UserDecryptAuthorization::new(
            &self.domain,
            &public_key,
            &payload.contract_addresses,
            start,
            days,
        );

        let now = unix_now().map_err(|e| RelayerError::Unavailable(e.to_string()))?;
        if !authorization.is_valid_at(now) {
            return Err(RelayerError::AuthorizationExpired {
                now,
                start,
                end: authorization.expires_at(),
            });
        }

        let signer = authorization.recover_signer(&payload.signature)?;
        if signer != payload.user_address {
            warn!(
                "Decryption request for {} signed by {}",
                payload.user_address, signer
            );
            return Err(RelayerError::InvalidSignature(format!(
                "recovered {} instead of {}",
                signer, payload.user_address
            )));
        }

        let response = payload
            .handle_contract_pairs
            .iter()
            .map(|pair| -> Result<UserDecryptShare, RelayerError> {
                let value = self
                    .plaintext(&pair.handle)
                    .ok_or(RelayerError::UnknownHandle(pair.handle))?;
                for account in [payload.user_address, pair.contract_address] {
                    if !self.is_allowed(&pair.handle, &account) {
                        return Err(RelayerError::NotAllowed {
                            handle: pair.handle,
                            account,
                        });
                    }
                }
                let sealed = seal(&public_key, &value.value.to_be_bytes::<32>())?;
                Ok(UserDecryptShare {
                    handle: pair.handle,
                    sealed: sealed.to_hex(),
                })
            })
            .collect::<Result<Vec<_>, RelayerError>>()?;

        info!(
            "Served user decryption of {} handles for {}",
            response.len(),
            payload.user_address
        );
        Ok(UserDecryptResponse { response })
    }
}

fn parse_decimal(value: &str, field: &str) -> Result<u64, RelayerError> {
    value.parse().map_err(|_| RelayerError::Rejected {
        status: 400,
        message: format!("{} is not a decimal number: {}", field, value),
    })
}

#[async_trait]
impl ConfidentialClient for LocalOracle {
    fn decryption_domain(&self) -> DecryptionDomain {
        self.domain.clone()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError> {
        let recipient = self.sealing_key.public_key();
        let ciphertexts = values
            .iter()
            .map(|value| -> Result<String, RelayerError> {
                Ok(seal(&recipient, &value.to_bytes())?.to_hex())
            })
            .collect::<Result<Vec<_>, RelayerError>>()?;

        let response = self.serve_input_proof(&InputProofRequest {
            contract_address: contract,
            user_address: user,
            contract_chain_id: self.chain_id,
            ciphertexts,
        })?;
        Ok(EncryptedInput {
            handles: response.handles,
            input_proof: response.input_proof,
        })
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError> {
        let keypair = session_keypair(&request)?;
        let payload = UserDecryptPayload::from_request(&request, self.chain_id);
        let response = self.serve_user_decrypt(&payload)?;
        open_shares(&keypair, &response)
    }
}
