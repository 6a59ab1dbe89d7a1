// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::session::private_key;
use anyhow::{bail, Result};
use purechance_config::AppConfig;
use purechance_decryption::LocalWallet;

pub fn execute(config: &AppConfig) -> Result<()> {
    let Some(key) = private_key(config)? else {
        bail!("No private key configured. Set PRIVATE_KEY or `private_key` in your configuration.");
    };
    let wallet = LocalWallet::from_private_key(key.as_str())?;
    println!("{}", wallet.inner().address());

    Ok(())
}

pub fn game(config: &AppConfig) -> Result<()> {
    let Some(contract) = config.contract() else {
        bail!("Contract address missing. Set `chain.contract` in your configuration.");
    };
    println!("PureChance address: {}", contract);

    Ok(())
}
