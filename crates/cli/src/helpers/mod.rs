// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, bail, Result};
use purechance_game::GameError;
use tracing::error;
use zeroize::{Zeroize, Zeroizing};

pub mod session;
pub mod telemetry;

/// Normalize a private key to `0x` prefixed hex, rejecting anything else
pub fn ensure_hex_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 64 {
        bail!("private key must be 32 bytes of hex");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("private key must only contain hex characters [0-9a-fA-F]");
    }
    hex::decode(digits)?.zeroize();
    Ok(Zeroizing::new(format!("0x{}", digits)))
}

/// Log the full failure and hand back the short message shown to the player
pub fn game_error(err: GameError) -> anyhow::Error {
    error!("{}", err);
    anyhow!(err.status_message())
}
