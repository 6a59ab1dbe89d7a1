// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use purechance_decryption::DecryptError;
use std::fmt;
use thiserror::Error;

/// The player action a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BuyTicket,
    StartDraw,
    DecryptTicket,
    DecryptDraw,
    DecryptScore,
    Status,
}

impl Action {
    fn is_decryption(&self) -> bool {
        matches!(
            self,
            Action::DecryptTicket | Action::DecryptDraw | Action::DecryptScore
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::BuyTicket => "buy ticket",
            Action::StartDraw => "start draw",
            Action::DecryptTicket => "decrypt ticket",
            Action::DecryptDraw => "decrypt draw",
            Action::DecryptScore => "decrypt score",
            Action::Status => "status",
        };
        f.write_str(name)
    }
}

pub const TICKET_LOCKED: &str = "Ticket locked in. You can now start a draw.";
pub const DRAW_COMPLETED: &str = "Draw completed. Decrypt below to reveal the numbers and reward.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("{0}: no wallet connected")]
    WalletNotConnected(Action),

    #[error("{0}: contract address is not configured")]
    ContractMissing(Action),

    #[error("Encryption service unavailable: {0}")]
    EncryptionUnavailable(String),

    #[error("Could not encrypt picks: {0}")]
    EncryptionFailed(String),

    #[error("No active ticket")]
    NoActiveTicket,

    #[error("{0}: nothing to decrypt yet")]
    NothingToDecrypt(Action),

    #[error("{action} failed: {source}")]
    Decrypt {
        action: Action,
        #[source]
        source: DecryptError,
    },

    #[error("{action} transaction failed: {message}")]
    Transaction { action: Action, message: String },

    #[error("{action} transaction reverted")]
    Reverted { action: Action },

    #[error("{action}: contract read failed: {message}")]
    Read { action: Action, message: String },
}

impl GameError {
    /// One short line to show the player
    pub fn status_message(&self) -> &'static str {
        use GameError::*;
        match self {
            WalletNotConnected(Action::BuyTicket) => "Connect your wallet to lock a ticket.",
            WalletNotConnected(action) if action.is_decryption() => {
                "Connect your wallet to decrypt."
            }
            WalletNotConnected(_) => "Connect your wallet first.",
            ContractMissing(action) if action.is_decryption() => {
                "Contract address missing. Deploy before decrypting."
            }
            ContractMissing(_) => "Contract address missing. Deploy the contract and configure it.",
            EncryptionUnavailable(_) => "Encryption service is still initializing.",
            EncryptionFailed(_) => "Failed to buy ticket",
            NoActiveTicket => "Buy a ticket first",
            NothingToDecrypt(Action::DecryptTicket) => "No encrypted ticket to decrypt yet.",
            NothingToDecrypt(Action::DecryptScore) => "No encrypted score yet. Play a round first.",
            NothingToDecrypt(_) => "No draw to decrypt yet.",
            Decrypt { action, source } => decrypt_status(*action, source),
            Transaction {
                action: Action::BuyTicket,
                ..
            }
            | Reverted {
                action: Action::BuyTicket,
            } => "Failed to buy ticket",
            Transaction { .. } | Reverted { .. } => "Draw failed",
            Read { .. } => "Unable to reach the contract right now.",
        }
    }
}

fn decrypt_status(action: Action, source: &DecryptError) -> &'static str {
    match source {
        DecryptError::UserDeclined => "Signature request declined. Nothing was decrypted.",
        DecryptError::SignatureTimeout(_) => "Signature request expired. Try again.",
        DecryptError::SignerUnavailable(_) => "Connect your wallet to decrypt.",
        DecryptError::InvalidHandle(_) => "Nothing to decrypt for this value yet.",
        DecryptError::OracleUnavailable(_) | DecryptError::OracleTimeout(_) => {
            "Decryption service is unavailable. Try again shortly."
        }
        DecryptError::Cancelled => "Decryption cancelled.",
        DecryptError::OracleRejected(_)
        | DecryptError::OracleIncomplete(_)
        | DecryptError::Internal(_) => match action {
            Action::DecryptTicket => "Unable to decrypt ticket right now.",
            Action::DecryptDraw => "Unable to decrypt draw right now.",
            _ => "Unable to decrypt right now.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purechance_fhevm::Handle;

    #[test]
    fn test_decrypt_failures_have_distinct_messages() {
        let declined = GameError::Decrypt {
            action: Action::DecryptScore,
            source: DecryptError::UserDeclined,
        };
        let unavailable = GameError::Decrypt {
            action: Action::DecryptScore,
            source: DecryptError::OracleUnavailable("503".into()),
        };
        let invalid = GameError::Decrypt {
            action: Action::DecryptScore,
            source: DecryptError::InvalidHandle(Handle::ZERO),
        };

        let messages = [
            declined.status_message(),
            unavailable.status_message(),
            invalid.status_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_precondition_messages() {
        assert_eq!(
            GameError::WalletNotConnected(Action::BuyTicket).status_message(),
            "Connect your wallet to lock a ticket."
        );
        assert_eq!(
            GameError::WalletNotConnected(Action::DecryptDraw).status_message(),
            "Connect your wallet to decrypt."
        );
        assert_eq!(
            GameError::NothingToDecrypt(Action::DecryptScore).status_message(),
            "No encrypted score yet. Play a round first."
        );
        assert_eq!(
            GameError::WalletNotConnected(Action::Status).status_message(),
            "Connect your wallet first."
        );
        assert_eq!(
            GameError::ContractMissing(Action::DecryptTicket).status_message(),
            "Contract address missing. Deploy before decrypting."
        );
    }
}
