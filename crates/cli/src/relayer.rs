// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use purechance_config::AppConfig;
use purechance_fhevm::local::LocalOracle;
use purechance_relayer_server::RelayerServerBuilder;
use std::sync::Arc;
use tracing::info;

pub async fn execute(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let oracle = Arc::new(LocalOracle::new(
        config.chain().chain_id,
        config.decryption_domain(),
    ));
    info!(
        "Oracle input proofs are signed by {}",
        oracle.proof_signer_address()
    );

    let server = RelayerServerBuilder::new(oracle)
        .with_host(host.unwrap_or_else(|| config.relayer_server().host.clone()))
        .with_port(port.unwrap_or(config.relayer_server().port))
        .build();

    println!("Relayer listening on http://{}", server.bind_address());
    server.run().await
}
