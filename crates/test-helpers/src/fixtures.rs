// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{MockPureChance, Prompt, TestConnection, TestWallet};
use alloy::primitives::Address;
use purechance_decryption::{DecryptionConfig, UserDecryptor, WalletSigner};
use purechance_fhevm::{local::LocalOracle, DecryptionDomain};
use std::sync::Arc;

pub const TEST_CHAIN_ID: u64 = 31337;

pub fn game_address() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn decryption_contract() -> Address {
    Address::repeat_byte(0xdc)
}

pub fn local_oracle() -> Arc<LocalOracle> {
    Arc::new(LocalOracle::new(
        TEST_CHAIN_ID,
        DecryptionDomain::new(TEST_CHAIN_ID, decryption_contract()),
    ))
}

/// A deployed game, a player wallet and the oracle behind both
pub struct GameFixture {
    pub oracle: Arc<LocalOracle>,
    pub wallet: Arc<TestWallet>,
    pub contract: MockPureChance,
    pub decryptor: Arc<UserDecryptor>,
}

impl GameFixture {
    pub fn new(prompt: Prompt) -> Self {
        let oracle = local_oracle();
        let wallet = TestWallet::new(prompt);
        let contract = MockPureChance::new(game_address(), wallet.address(), oracle.clone());
        let decryptor = Arc::new(UserDecryptor::new(
            oracle.clone(),
            Arc::new(TestConnection(wallet.clone())),
            DecryptionConfig {
                retry_delay_ms: 1,
                ..DecryptionConfig::default()
            },
        ));
        Self {
            oracle,
            wallet,
            contract,
            decryptor,
        }
    }
}
