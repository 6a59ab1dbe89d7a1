// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{LocalWallet, WalletConnection, WalletError, WalletSigner};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use purechance_fhevm::{
    local::LocalOracle, ClearValue, ConfidentialClient, DecryptedValues, DecryptionDomain,
    EncryptedInput, FheType, Handle, RelayerError, UserDecryptAuthorization, UserDecryptRequest,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

pub const CHAIN_ID: u64 = 31337;

pub fn contract() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn oracle() -> Arc<LocalOracle> {
    Arc::new(LocalOracle::new(
        CHAIN_ID,
        DecryptionDomain::new(CHAIN_ID, Address::repeat_byte(0x55)),
    ))
}

/// Store `value` and let both `user` and the test contract decrypt it
pub fn allowed_handle(oracle: &LocalOracle, user: Address, value: u64) -> Handle {
    let handle = oracle.trivial_encrypt(FheType::Uint8.clear(value));
    oracle.allow(handle, contract());
    oracle.allow(handle, user);
    handle
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum WalletBehaviour {
    Sign,
    Decline,
    Hang,
}

pub struct TestWallet {
    inner: LocalWallet,
    behaviour: WalletBehaviour,
    prompts: AtomicUsize,
}

impl TestWallet {
    pub fn new(behaviour: WalletBehaviour) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalWallet::random(),
            behaviour,
            prompts: AtomicUsize::new(0),
        })
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for TestWallet {
    fn address(&self) -> Address {
        WalletSigner::address(&self.inner)
    }

    async fn sign_authorization(
        &self,
        authorization: &UserDecryptAuthorization,
    ) -> Result<String, WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            WalletBehaviour::Sign => self.inner.sign_authorization(authorization).await,
            WalletBehaviour::Decline => Err(WalletError::Declined("rejected in wallet".into())),
            WalletBehaviour::Hang => futures::future::pending().await,
        }
    }
}

/// Connection that always hands out the same test wallet
pub struct Connected(pub Arc<TestWallet>);

#[async_trait]
impl WalletConnection for Connected {
    async fn signer(&self) -> Result<Option<Arc<dyn WalletSigner>>, WalletError> {
        Ok(Some(self.0.clone()))
    }
}

/// Oracle wrapper that can fail, pad or trim its answers and records what
/// it was asked.
pub struct ScriptedClient {
    pub inner: Arc<LocalOracle>,
    pub failures: Mutex<Vec<RelayerError>>,
    pub extra: Mutex<Option<(Handle, U256)>>,
    pub omit: Mutex<Option<Handle>>,
    pub requests: Mutex<Vec<UserDecryptRequest>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(inner: Arc<LocalOracle>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failures: Mutex::new(vec![]),
            extra: Mutex::new(None),
            omit: Mutex::new(None),
            requests: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfidentialClient for ScriptedClient {
    fn decryption_domain(&self) -> DecryptionDomain {
        self.inner.decryption_domain()
    }

    fn chain_id(&self) -> u64 {
        self.inner.chain_id()
    }

    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError> {
        self.inner.encrypt_input(contract, user, values).await
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(err) = self.failures.lock().unwrap().pop() {
            return Err(err);
        }
        let mut values = self.inner.user_decrypt(request).await?;
        if let Some((handle, value)) = *self.extra.lock().unwrap() {
            values.insert(handle, value);
        }
        if let Some(handle) = *self.omit.lock().unwrap() {
            values.remove(&handle);
        }
        Ok(values)
    }
}
