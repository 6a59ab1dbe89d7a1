// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{game_error, session};
use anyhow::Result;
use purechance_config::AppConfig;
use purechance_game::{Pick, TICKET_LOCKED};

pub async fn execute(config: &AppConfig, first: i64, second: i64) -> Result<()> {
    // The library pulls picks into range, the cli refuses them instead
    let first = Pick::try_from(first)?;
    let second = Pick::try_from(second)?;

    let game = session::connect(config).await?;
    let purchase = game
        .buy_ticket(first.value().into(), second.value().into())
        .await
        .map_err(game_error)?;

    println!("{}", TICKET_LOCKED);
    println!("Picks: {} and {}", purchase.picks[0], purchase.picks[1]);
    println!("Transaction: {}", purchase.outcome.tx_hash);

    Ok(())
}
