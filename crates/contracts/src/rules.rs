// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Game rules enforced on-chain, mirrored here for clients and test doubles.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest and highest number a pick or a draw can take
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 9;

pub const REWARD_NO_MATCH: u32 = 0;
pub const REWARD_ONE_MATCH: u32 = 10;
pub const REWARD_TWO_MATCHES: u32 = 100;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Picks must be integers between {MIN_NUMBER} and {MAX_NUMBER}, got {0}")]
pub struct InvalidPick(pub i64);

/// A number between [`MIN_NUMBER`] and [`MAX_NUMBER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Pick(u8);

impl Pick {
    /// Pull any number into range the way the ticket form does
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(MIN_NUMBER as i64, MAX_NUMBER as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Pick {
    type Error = InvalidPick;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (MIN_NUMBER as i64..=MAX_NUMBER as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidPick(value))
        }
    }
}

impl From<Pick> for u8 {
    fn from(value: Pick) -> Self {
        value.0
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reward for a draw: numbers only count when they match in position
pub fn reward_for(picks: [u8; 2], draw: [u8; 2]) -> u32 {
    let matches = picks.iter().zip(draw.iter()).filter(|(p, d)| p == d).count();
    match matches {
        0 => REWARD_NO_MATCH,
        1 => REWARD_ONE_MATCH,
        _ => REWARD_TWO_MATCHES,
    }
}
