// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::ensure_hex_zeroizing;
use anyhow::{anyhow, Context, Result};
use purechance_config::AppConfig;
use purechance_contracts::{PureChanceContractFactory, PureChanceGame};
use purechance_decryption::{Disconnected, LocalWallet, UserDecryptor, WalletConnection};
use purechance_fhevm::{relayer::HttpRelayer, ConfidentialClient};
use purechance_game::GameClient;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// The configured private key, if any
pub fn private_key(config: &AppConfig) -> Result<Option<Zeroizing<String>>> {
    config
        .private_key()
        .map(ensure_hex_zeroizing)
        .transpose()
        .context("Invalid private_key")
}

/// Wire a [`GameClient`] from configuration: the http relayer, a wallet
/// backed by the configured key and, when both a key and a contract address
/// are set, the on chain game contract.
pub async fn connect(config: &AppConfig) -> Result<GameClient> {
    let private_key = private_key(config)?;

    let relayer: Arc<dyn ConfidentialClient> = Arc::new(HttpRelayer::new(
        &config.relayer().url,
        config.chain().chain_id,
        config.decryption_domain(),
    )?);

    let wallet: Arc<dyn WalletConnection> = match &private_key {
        Some(key) => Arc::new(LocalWallet::from_private_key(key.as_str())?),
        None => {
            warn!("No private key configured. Set PRIVATE_KEY to play.");
            Arc::new(Disconnected)
        }
    };

    let contract: Option<Arc<dyn PureChanceGame>> = match (&private_key, config.contract()) {
        (Some(key), Some(address)) => {
            let contract = PureChanceContractFactory::create_write(
                &config.chain().rpc_url,
                &address.to_string(),
                key.as_str(),
            )
            .await
            .map_err(|e| anyhow!("Could not connect to {}: {}", config.chain().rpc_url, e))?;
            info!("Using PureChance at {}", address);
            Some(Arc::new(contract) as Arc<dyn PureChanceGame>)
        }
        _ => None,
    };

    let decryptor = Arc::new(UserDecryptor::new(
        relayer,
        wallet,
        config.decryption().clone(),
    ));

    Ok(GameClient::new(contract, decryptor))
}
