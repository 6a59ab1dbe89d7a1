// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::Address,
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;
use purechance_fhevm::UserDecryptAuthorization;
use std::{fmt, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Signature request declined: {0}")]
    Declined(String),

    #[error("Wallet unavailable: {0}")]
    Unavailable(String),
}

/// Account able to sign typed data on behalf of the user
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Sign the authorization's typed data. Returns the hex signature with
    /// its `0x` marker, as wallets do.
    async fn sign_authorization(
        &self,
        authorization: &UserDecryptAuthorization,
    ) -> Result<String, WalletError>;
}

/// A wallet that may or may not currently have an account connected
#[async_trait]
pub trait WalletConnection: Send + Sync {
    async fn signer(&self) -> Result<Option<Arc<dyn WalletSigner>>, WalletError>;
}

/// Wallet backed by a private key held in memory
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn from_private_key(private_key: &str) -> Result<Self, WalletError> {
        let signer = private_key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| WalletError::Unavailable(format!("invalid private key: {}", e)))?;
        Ok(Self::new(signer))
    }

    pub fn inner(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .finish()
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_authorization(
        &self,
        authorization: &UserDecryptAuthorization,
    ) -> Result<String, WalletError> {
        let signature = self
            .signer
            .sign_hash(&authorization.signing_hash())
            .await
            .map_err(|e| WalletError::Unavailable(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}

#[async_trait]
impl WalletConnection for LocalWallet {
    async fn signer(&self) -> Result<Option<Arc<dyn WalletSigner>>, WalletError> {
        Ok(Some(Arc::new(self.clone())))
    }
}

/// No account connected
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

#[async_trait]
impl WalletConnection for Disconnected {
    async fn signer(&self) -> Result<Option<Arc<dyn WalletSigner>>, WalletError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purechance_fhevm::{DecryptionDomain, EphemeralKeypair};

    #[tokio::test]
    async fn test_local_wallet_signature_recovers_to_address() {
        let wallet = LocalWallet::random();
        let keypair = EphemeralKeypair::generate();
        let authorization = UserDecryptAuthorization::new(
            &DecryptionDomain::new(1, Address::repeat_byte(0x10)),
            &keypair.public_key(),
            &[Address::repeat_byte(0x20)],
            1_700_000_000,
            7,
        );

        let signature = wallet.sign_authorization(&authorization).await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 130);
        assert_eq!(
            authorization.recover_signer(&signature).unwrap(),
            WalletSigner::address(&wallet)
        );
    }

    #[tokio::test]
    async fn test_disconnected_has_no_signer() {
        assert!(Disconnected.signer().await.unwrap().is_none());
    }

    #[test]
    fn test_from_private_key() {
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let wallet = LocalWallet::from_private_key(key).unwrap();
        assert_eq!(
            WalletSigner::address(&wallet),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert!(LocalWallet::from_private_key("nope").is_err());
    }
}
