// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use async_trait::async_trait;
use purechance_decryption::{LocalWallet, WalletConnection, WalletError, WalletSigner};
use purechance_fhevm::UserDecryptAuthorization;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

/// How a [`TestWallet`] answers signature prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Approve,
    Decline,
}

/// Wallet that counts prompts, can be told to refuse them and can be
/// disconnected at runtime.
pub struct TestWallet {
    inner: LocalWallet,
    prompt: Prompt,
    connected: AtomicBool,
    prompts: AtomicUsize,
}

impl TestWallet {
    pub fn new(prompt: Prompt) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalWallet::random(),
            prompt,
            connected: AtomicBool::new(true),
            prompts: AtomicUsize::new(0),
        })
    }

    pub fn approving() -> Arc<Self> {
        Self::new(Prompt::Approve)
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Signature prompts shown so far
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
        match self.prompt {
            Prompt::Approve => self.inner.sign_authorization(authorization).await,
            Prompt::Decline => Err(WalletError::Declined("user rejected the request".into())),
        }
    }
}

/// Exposes a shared [`TestWallet`] as a wallet connection
pub struct TestConnection(pub Arc<TestWallet>);

#[async_trait]
impl WalletConnection for TestConnection {
    async fn signer(&self) -> Result<Option<Arc<dyn WalletSigner>>, WalletError> {
        if !self.0.connected.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(self.0.clone()))
    }
}
