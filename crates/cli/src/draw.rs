// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{game_error, session};
use anyhow::Result;
use purechance_config::AppConfig;
use purechance_game::DRAW_COMPLETED;

/// Start a draw, then reveal it together with the new score
pub async fn execute(config: &AppConfig) -> Result<()> {
    let game = session::connect(config).await?;

    let outcome = game.start_draw().await.map_err(game_error)?;
    println!("{}", DRAW_COMPLETED);
    println!("Transaction: {}", outcome.tx_hash);

    let draw = game.decrypt_last_draw().await.map_err(game_error)?;
    println!("{}", draw);

    let score = game.decrypt_score().await.map_err(game_error)?;
    println!("Score: {}", score);

    Ok(())
}
