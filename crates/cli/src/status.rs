// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{game_error, session};
use anyhow::Result;
use purechance_config::AppConfig;

pub async fn execute(config: &AppConfig) -> Result<()> {
    let game = session::connect(config).await?;
    let status = game.status().await.map_err(game_error)?;
    println!("{}", status);
    Ok(())
}
