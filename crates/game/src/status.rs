// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use purechance_contracts::{LastDraw, Pick, Ticket, TxOutcome};
use purechance_fhevm::Handle;
use purechance_utils::preview;
use serde::Serialize;
use std::fmt;

/// Everything the game panels show before anything is decrypted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStatus {
    pub player: Address,
    pub contract: Address,
    pub ticket: Ticket,
    pub score: Handle,
    pub last_draw: LastDraw,
}

impl GameStatus {
    pub fn ticket_label(&self) -> &'static str {
        if self.ticket.active {
            "Ready"
        } else {
            "Buy a ticket first"
        }
    }

    pub fn last_draw_label(&self) -> String {
        match self.last_draw.block_number {
            0 => "Waiting for first draw".to_string(),
            block => block.to_string(),
        }
    }

    pub fn reward_label(&self) -> String {
        match self.last_draw.decryptable_handles() {
            Some([_, _, reward]) => reward.preview(),
            None => "Not available yet".to_string(),
        }
    }

    pub fn score_label(&self) -> String {
        if self.score.is_zero() {
            "Not ready".to_string()
        } else {
            preview(&self.score.to_string(), 12)
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Player:           {}", self.player)?;
        writeln!(f, "Contract:         {}", self.contract)?;
        writeln!(f, "Ticket:           {}", self.ticket_label())?;
        writeln!(f, "Last draw block:  {}", self.last_draw_label())?;
        writeln!(f, "Encrypted reward: {}", self.reward_label())?;
        write!(f, "Encrypted score:  {}", self.score_label())
    }
}

/// A purchased ticket together with the picks that went into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TicketPurchase {
    pub picks: [Pick; 2],
    pub handles: [Handle; 2],
    pub outcome: TxOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevealedTicket {
    pub first: u64,
    pub second: u64,
}

impl fmt::Display for RevealedTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.first, self.second)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevealedDraw {
    pub first: u64,
    pub second: u64,
    pub reward: u64,
    pub block_number: u64,
}

impl fmt::Display for RevealedDraw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Numbers: {} & {} · Reward: {}",
            self.first, self.second, self.reward
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;
    use purechance_fhevm::FheType;

    #[test]
    fn test_labels_before_first_round() {
        let status = GameStatus {
            player: Address::repeat_byte(1),
            contract: Address::repeat_byte(2),
            ticket: Ticket::default(),
            score: Handle::ZERO,
            last_draw: LastDraw::default(),
        };
        assert_eq!(status.ticket_label(), "Buy a ticket first");
        assert_eq!(status.last_draw_label(), "Waiting for first draw");
        assert_eq!(status.reward_label(), "Not available yet");
        assert_eq!(status.score_label(), "Not ready");
    }

    #[test]
    fn test_labels_after_a_draw() {
        let handle = |seed: &[u8]| Handle::compose(keccak256(seed), 0, 1, FheType::Uint32);
        let status = GameStatus {
            player: Address::repeat_byte(1),
            contract: Address::repeat_byte(2),
            ticket: Ticket {
                first_pick: handle(b"a"),
                second_pick: handle(b"b"),
                active: true,
            },
            score: handle(b"score"),
            last_draw: LastDraw {
                first: handle(b"c"),
                second: handle(b"d"),
                reward: handle(b"reward"),
                block_number: 42,
            },
        };
        assert_eq!(status.ticket_label(), "Ready");
        assert_eq!(status.last_draw_label(), "42");
        assert_eq!(status.reward_label(), handle(b"reward").preview());
        assert_eq!(status.score_label().len(), 15);
        assert!(status.to_string().contains("Last draw block:  42"));
    }
}
