// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::{B256, U256},
    rpc::types::TransactionReceipt,
};
use purechance_fhevm::Handle;
use serde::{Deserialize, Serialize};

/// Price of one ticket: 0.001 ETH
pub const TICKET_PRICE_WEI: U256 = U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);

/// Encrypted ticket as stored for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ticket {
    pub first_pick: Handle,
    pub second_pick: Handle,
    pub active: bool,
}

impl Ticket {
    /// Both pick handles, or `None` while either is still unset
    pub fn decryptable_handles(&self) -> Option<[Handle; 2]> {
        if self.first_pick.is_zero() || self.second_pick.is_zero() {
            return None;
        }
        Some([self.first_pick, self.second_pick])
    }
}

/// Result of a player's most recent draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LastDraw {
    pub first: Handle,
    pub second: Handle,
    pub reward: Handle,
    pub block_number: u64,
}

impl LastDraw {
    /// Draw numbers and reward handles, or `None` until a draw has happened
    pub fn decryptable_handles(&self) -> Option<[Handle; 3]> {
        if self.first.is_zero() || self.second.is_zero() || self.reward.is_zero() {
            return None;
        }
        Some([self.first, self.second, self.reward])
    }
}

/// What callers need to know about a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

impl From<&TransactionReceipt> for TxOutcome {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, utils::parse_ether};
    use purechance_fhevm::FheType;

    fn handle(seed: &[u8]) -> Handle {
        Handle::compose(keccak256(seed), 0, 1, FheType::Uint8)
    }

    #[test]
    fn test_ticket_price_is_a_thousandth_of_an_ether() {
        assert_eq!(TICKET_PRICE_WEI, parse_ether("0.001").unwrap());
    }

    #[test]
    fn test_ticket_needs_both_handles() {
        let mut ticket = Ticket {
            first_pick: Handle::ZERO,
            second_pick: handle(b"second"),
            active: true,
        };
        assert_eq!(ticket.decryptable_handles(), None);

        ticket.first_pick = handle(b"first");
        assert_eq!(
            ticket.decryptable_handles(),
            Some([handle(b"first"), handle(b"second")])
        );
    }

    #[test]
    fn test_last_draw_needs_all_handles() {
        let draw = LastDraw {
            first: handle(b"a"),
            second: handle(b"b"),
            reward: Handle::ZERO,
            block_number: 12,
        };
        assert_eq!(draw.decryptable_handles(), None);
        assert_eq!(LastDraw::default().decryptable_handles(), None);
    }
}
