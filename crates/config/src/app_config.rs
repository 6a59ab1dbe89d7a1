// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use crate::validation::ValidUrl;
use crate::yaml::load_yaml_with_env;
use alloy::primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use purechance_decryption::DecryptionConfig;
use purechance_fhevm::DecryptionDomain;
use serde::{Deserialize, Serialize};
use std::{env, fmt, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "purechance.config.yaml";
pub const ENV_PREFIX: &str = "PURECHANCE_";

/// The chain the game contract lives on
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// JSON-RPC endpoint, http(s) or ws(s)
    pub rpc_url: String,
    pub chain_id: u64,
    /// Deployed PureChance contract, game commands need it
    pub contract: Option<Address>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            contract: None,
        }
    }
}

/// Where encrypted inputs and user decryptions are served
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayerConfig {
    pub url: String,
    /// Chain id of the EIP-712 domain decryption requests are signed under
    pub gateway_chain_id: u64,
    /// Verifying contract of that domain
    pub verifying_contract: Address,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:13152".to_string(),
            gateway_chain_id: 31337,
            verifying_contract: Address::ZERO,
        }
    }
}

/// Listen address of the local relayer server
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 13152,
        }
    }
}

/// Configuration as it appears in yaml and the environment
#[derive(Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawAppConfig {
    chain: ChainConfig,
    relayer: RelayerConfig,
    relayer_server: ServerConfig,
    decryption: DecryptionConfig,
    /// Hex encoded key of the player's account. Prefer `${PRIVATE_KEY}`.
    private_key: Option<String>,
    /// Set the Open Telemetry collector grpc endpoint. Eg. 127.0.0.1:4317
    otel: Option<String>,
}

/// The validated config used throughout the app
#[derive(Clone)]
pub struct AppConfig {
    chain: ChainConfig,
    relayer: RelayerConfig,
    relayer_server: ServerConfig,
    decryption: DecryptionConfig,
    private_key: Option<String>,
    otel: Option<String>,
    config_file: PathBuf,
}

impl AppConfig {
    pub fn try_from_raw(raw: RawAppConfig, config_file: PathBuf) -> Result<Self> {
        ValidUrl::with_schemes(&raw.chain.rpc_url, &["http", "https", "ws", "wss"])
            .context("Invalid chain.rpc_url")?;
        ValidUrl::with_schemes(&raw.relayer.url, &["http", "https"])
            .context("Invalid relayer.url")?;

        if raw.chain.chain_id == 0 {
            bail!("chain.chain_id must not be zero");
        }
        if raw.decryption.oracle_attempts == 0 {
            bail!("decryption.oracle_attempts must be at least 1");
        }

        let private_key = raw
            .private_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(AppConfig {
            chain: raw.chain,
            relayer: raw.relayer,
            relayer_server: raw.relayer_server,
            decryption: raw.decryption,
            private_key,
            otel: raw.otel,
            config_file,
        })
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn relayer(&self) -> &RelayerConfig {
        &self.relayer
    }

    pub fn relayer_server(&self) -> &ServerConfig {
        &self.relayer_server
    }

    pub fn decryption(&self) -> &DecryptionConfig {
        &self.decryption
    }

    /// Get the configured game contract
    pub fn contract(&self) -> Option<Address> {
        self.chain.contract
    }

    /// Domain user decryption authorizations are signed under
    pub fn decryption_domain(&self) -> DecryptionDomain {
        DecryptionDomain::new(
            self.relayer.gateway_chain_id,
            self.relayer.verifying_contract,
        )
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    /// Get the open telemetry collector url
    pub fn otel(&self) -> Option<String> {
        self.otel.clone()
    }

    /// Get the config file path
    pub fn config_file(&self) -> PathBuf {
        self.config_file.clone()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("chain", &self.chain)
            .field("relayer", &self.relayer)
            .field("relayer_server", &self.relayer_server)
            .field("decryption", &self.decryption)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("otel", &self.otel)
            .field("config_file", &self.config_file)
            .finish()
    }
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    otel: Option<String>,
}

/// Load the config at `config_file`, or the first `purechance.config.yaml` found
/// walking up from the current directory, or the one in the OS config dir.
/// Missing default files fall back to the built in defaults; a missing
/// explicit file is an error.
pub fn load_config(config_file: Option<String>, otel: Option<String>) -> Result<AppConfig> {
    let explicit_file = config_file.map(PathBuf::from);

    let resolved_config_path = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        explicit_file.clone(),
    );

    let mut figment = Figment::from(Serialized::defaults(RawAppConfig::default()));

    if explicit_file.is_some() || resolved_config_path.exists() {
        let loaded_yaml = load_yaml_with_env(&resolved_config_path).with_context(|| {
            format!(
                "Could not read configuration file {}",
                resolved_config_path.display()
            )
        })?;
        figment = figment.merge(Yaml::string(&loaded_yaml));
    } else {
        debug!(
            "No configuration at {}, using defaults",
            resolved_config_path.display()
        );
    }

    let raw: RawAppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&["PRIVATE_KEY"]))
        .merge(Serialized::defaults(CliOverrides { otel }))
        .extract()
        .context("Could not parse configuration")?;

    AppConfig::try_from_raw(raw, resolved_config_path)
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("purechance"))
            .ok_or_else(|| anyhow!("PureChance needs an OS that provides a config dir"))
    }
}
