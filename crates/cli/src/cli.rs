// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{address, buy_ticket, decrypt, draw, relayer, status};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use purechance_config::validation::ValidUrl;
use purechance_config::{load_config, AppConfig};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "purechance")]
#[command(about = "Play PureChance, the encrypted two number lottery", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `purechance -vvv` will give
    /// you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<ValidUrl>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;

        setup_tracing(&config, self.log_level())?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Address => address::execute(&config)?,
            Commands::GameAddress => address::game(&config)?,
            Commands::BuyTicket { first, second } => {
                buy_ticket::execute(&config, first, second).await?
            }
            Commands::Draw => draw::execute(&config).await?,
            Commands::DecryptScore => decrypt::score(&config).await?,
            Commands::DecryptTicket => decrypt::ticket(&config).await?,
            Commands::DecryptDraw => decrypt::last_draw(&config).await?,
            Commands::Status => status::execute(&config).await?,
            Commands::Relayer { host, port } => relayer::execute(&config, host, port).await?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.clone(), self.otel.clone().map(Into::into))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the address of the configured account
    Address,

    /// Print the configured PureChance contract address
    GameAddress,

    /// Encrypt two picks and buy a ticket with them
    BuyTicket {
        /// First pick, 1 to 9
        #[arg(long)]
        first: i64,

        /// Second pick, 1 to 9
        #[arg(long)]
        second: i64,
    },

    /// Draw against the active ticket and reveal the result
    Draw,

    /// Decrypt the accumulated score
    DecryptScore,

    /// Decrypt the picks of the current ticket
    DecryptTicket,

    /// Decrypt the numbers and reward of the last draw
    DecryptDraw,

    /// Show the ticket, score and last draw without decrypting
    Status,

    /// Run a local relayer backed by an in-memory oracle
    Relayer {
        /// Listen host, overrides `relayer_server.host`
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides `relayer_server.port`
        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_buy_ticket() {
        let cli = Cli::parse_from([
            "purechance",
            "-vv",
            "buy-ticket",
            "--first",
            "5",
            "--second",
            "7",
        ]);
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(matches!(
            cli.command,
            Commands::BuyTicket {
                first: 5,
                second: 7
            }
        ));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["purechance", "-q", "-v", "status"]).is_err());
        let cli = Cli::parse_from(["purechance", "status", "--quiet"]);
        assert_eq!(cli.log_level(), Level::ERROR);
    }
}
