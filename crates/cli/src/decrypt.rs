// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{game_error, session};
use anyhow::Result;
use purechance_config::AppConfig;
use purechance_game::GameError;

pub async fn score(config: &AppConfig) -> Result<()> {
    let game = session::connect(config).await?;
    match game.decrypt_score().await {
        Ok(score) => println!("{}", score),
        // never played
        Err(GameError::NothingToDecrypt(_)) => println!("0"),
        Err(e) => return Err(game_error(e)),
    }
    Ok(())
}

pub async fn ticket(config: &AppConfig) -> Result<()> {
    let game = session::connect(config).await?;
    let ticket = game.decrypt_ticket().await.map_err(game_error)?;
    println!("{}", ticket);
    Ok(())
}

pub async fn last_draw(config: &AppConfig) -> Result<()> {
    let game = session::connect(config).await?;
    let draw = game.decrypt_last_draw().await.map_err(game_error)?;
    println!("{}", draw);
    Ok(())
}
