// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Action, GameError, GameStatus, RevealedDraw, RevealedTicket, TicketPurchase};
use alloy::primitives::{Address, U256};
use purechance_contracts::{Pick, PureChanceGame, PureChanceRead, PureChanceWrite, TxOutcome};
use purechance_decryption::{DecryptionCoordinator, UserDecryptor};
use purechance_fhevm::{DecryptedValues, Handle};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// The three game panels (ticket, draw, score) as library calls.
///
/// Every call checks its preconditions (connected wallet, configured
/// contract, handles that are set) before touching the network.
pub struct GameClient {
    contract: Option<Arc<dyn PureChanceGame>>,
    coordinator: DecryptionCoordinator,
}

impl GameClient {
    pub fn new(contract: Option<Arc<dyn PureChanceGame>>, decryptor: Arc<UserDecryptor>) -> Self {
        Self {
            contract,
            coordinator: DecryptionCoordinator::new(decryptor),
        }
    }

    pub fn coordinator(&self) -> &DecryptionCoordinator {
        &self.coordinator
    }

    fn decryptor(&self) -> &Arc<UserDecryptor> {
        self.coordinator.decryptor()
    }

    fn contract(&self, action: Action) -> Result<&Arc<dyn PureChanceGame>, GameError> {
        self.contract
            .as_ref()
            .ok_or(GameError::ContractMissing(action))
    }

    /// Address of the connected account
    pub async fn account(&self, action: Action) -> Result<Address, GameError> {
        let decryptor = self.decryptor();
        match timeout(
            decryptor.config().signer_timeout(),
            decryptor.wallet().signer(),
        )
        .await
        {
            Ok(Ok(Some(signer))) => Ok(signer.address()),
            Ok(Ok(None)) => Err(GameError::WalletNotConnected(action)),
            Ok(Err(e)) => {
                warn!("Wallet error: {}", e);
                Err(GameError::WalletNotConnected(action))
            }
            Err(_) => {
                warn!("Wallet did not respond");
                Err(GameError::WalletNotConnected(action))
            }
        }
    }

    /// Encrypt two picks (pulled into 1..=9) and buy a ticket with them
    #[instrument(skip(self))]
    pub async fn buy_ticket(&self, first: i64, second: i64) -> Result<TicketPurchase, GameError> {
        let action = Action::BuyTicket;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;
        let picks = [Pick::clamped(first), Pick::clamped(second)];

        let input = self
            .decryptor()
            .client()
            .create_encrypted_input(contract.address(), player)
            .add8(picks[0].value())
            .add8(picks[1].value())
            .encrypt()
            .await
            .map_err(|e| {
                if e.is_transient() {
                    GameError::EncryptionUnavailable(e.to_string())
                } else {
                    GameError::EncryptionFailed(e.to_string())
                }
            })?;

        let outcome = contract
            .buy_ticket(&input)
            .await
            .map_err(|e| GameError::Transaction {
                action,
                message: e.to_string(),
            })?;
        ensure_mined(action, &outcome)?;

        info!("Ticket bought in block {:?}", outcome.block_number);
        Ok(TicketPurchase {
            picks,
            handles: [input.handles[0], input.handles[1]],
            outcome,
        })
    }

    /// Draw against the player's active ticket
    #[instrument(skip(self))]
    pub async fn start_draw(&self) -> Result<TxOutcome, GameError> {
        let action = Action::StartDraw;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;

        let ticket = contract
            .get_ticket(player)
            .await
            .map_err(|e| read_error(action, e))?;
        if !ticket.active {
            return Err(GameError::NoActiveTicket);
        }

        let outcome = contract
            .start_draw()
            .await
            .map_err(|e| GameError::Transaction {
                action,
                message: e.to_string(),
            })?;
        ensure_mined(action, &outcome)?;

        info!("Draw completed in block {:?}", outcome.block_number);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn decrypt_ticket(&self) -> Result<RevealedTicket, GameError> {
        let action = Action::DecryptTicket;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;

        let ticket = contract
            .get_ticket(player)
            .await
            .map_err(|e| read_error(action, e))?;
        let handles = ticket
            .decryptable_handles()
            .ok_or(GameError::NothingToDecrypt(action))?;

        let values = self
            .decrypt(action, player, contract.address(), &handles)
            .await?;
        Ok(RevealedTicket {
            first: value_of(&values, &handles[0]),
            second: value_of(&values, &handles[1]),
        })
    }

    #[instrument(skip(self))]
    pub async fn decrypt_last_draw(&self) -> Result<RevealedDraw, GameError> {
        let action = Action::DecryptDraw;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;

        let draw = contract
            .get_last_draw(player)
            .await
            .map_err(|e| read_error(action, e))?;
        let handles = draw
            .decryptable_handles()
            .ok_or(GameError::NothingToDecrypt(action))?;

        let values = self
            .decrypt(action, player, contract.address(), &handles)
            .await?;
        Ok(RevealedDraw {
            first: value_of(&values, &handles[0]),
            second: value_of(&values, &handles[1]),
            reward: value_of(&values, &handles[2]),
            block_number: draw.block_number,
        })
    }

    #[instrument(skip(self))]
    pub async fn decrypt_score(&self) -> Result<u64, GameError> {
        let action = Action::DecryptScore;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;

        let score = contract
            .get_encrypted_score(player)
            .await
            .map_err(|e| read_error(action, e))?;
        if score.is_zero() {
            return Err(GameError::NothingToDecrypt(action));
        }

        let values = self
            .decrypt(action, player, contract.address(), &[score])
            .await?;
        Ok(value_of(&values, &score))
    }

    /// Ticket, score and last draw handles without decrypting anything
    pub async fn status(&self) -> Result<GameStatus, GameError> {
        let action = Action::Status;
        let player = self.account(action).await?;
        let contract = self.contract(action)?;
        let read = |e| read_error(action, e);

        Ok(GameStatus {
            player,
            contract: contract.address(),
            ticket: contract.get_ticket(player).await.map_err(read)?,
            score: contract.get_encrypted_score(player).await.map_err(read)?,
            last_draw: contract.get_last_draw(player).await.map_err(read)?,
        })
    }

    async fn decrypt(
        &self,
        action: Action,
        player: Address,
        contract: Address,
        handles: &[Handle],
    ) -> Result<DecryptedValues, GameError> {
        self.coordinator
            .request(player, contract, handles)
            .result()
            .await
            .map_err(|source| GameError::Decrypt { action, source })
    }
}

fn ensure_mined(action: Action, outcome: &TxOutcome) -> Result<(), GameError> {
    if outcome.success {
        Ok(())
    } else {
        Err(GameError::Reverted { action })
    }
}

fn read_error(action: Action, error: eyre::Report) -> GameError {
    GameError::Read {
        action,
        message: error.to_string(),
    }
}

fn value_of(values: &DecryptedValues, handle: &Handle) -> u64 {
    values
        .get(handle)
        .copied()
        .unwrap_or(U256::ZERO)
        .saturating_to()
}

#[cfg(test)]
mod tests {
    use super::*;
    use purechance_decryption::DecryptError;
    use purechance_test_helpers::{GameFixture, Prompt};
    use tracing_test::traced_test;

    fn game(fixture: &GameFixture) -> GameClient {
        GameClient::new(
            Some(Arc::new(fixture.contract.clone())),
            fixture.decryptor.clone(),
        )
    }

    #[tokio::test]
    async fn test_bought_ticket_decrypts_to_picks() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);

        let purchase = game.buy_ticket(5, 7).await.unwrap();
        assert!(purchase.outcome.success);

        let ticket = game.decrypt_ticket().await.unwrap();
        assert_eq!(ticket, RevealedTicket { first: 5, second: 7 });
        assert_eq!(fixture.wallet.prompts(), 1);
        assert_eq!(fixture.oracle.user_decrypt_calls(), 1);
    }

    #[tokio::test]
    async fn test_picks_are_clamped() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);

        let purchase = game.buy_ticket(0, 12).await.unwrap();
        assert_eq!(purchase.picks[0].value(), 1);
        assert_eq!(purchase.picks[1].value(), 9);
        assert_eq!(
            game.decrypt_ticket().await.unwrap(),
            RevealedTicket { first: 1, second: 9 }
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_draw_updates_score() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);

        game.buy_ticket(5, 7).await.unwrap();
        assert_eq!(game.decrypt_score().await.unwrap(), 0);

        fixture.contract.script_draw(5, 2);
        game.start_draw().await.unwrap();

        let draw = game.decrypt_last_draw().await.unwrap();
        assert_eq!((draw.first, draw.second, draw.reward), (5, 2, 10));
        assert!(draw.block_number > 0);
        assert_eq!(game.decrypt_score().await.unwrap(), 10);

        let status = game.status().await.unwrap();
        assert!(!status.ticket.active);
        assert!(logs_contain("Draw completed"));
    }

    #[tokio::test]
    async fn test_first_draw_score_is_its_reward() {
        for (draw, reward) in [([1, 2], 0), ([5, 3], 10), ([5, 7], 100)] {
            let fixture = GameFixture::new(Prompt::Approve);
            let game = game(&fixture);

            game.buy_ticket(5, 7).await.unwrap();
            fixture.contract.script_draw(draw[0], draw[1]);
            game.start_draw().await.unwrap();

            let revealed = game.decrypt_last_draw().await.unwrap();
            assert_eq!(revealed.reward, reward);
            assert!(!game.status().await.unwrap().score.is_zero());
            assert_eq!(game.decrypt_score().await.unwrap(), reward);
        }
    }

    #[tokio::test]
    async fn test_draw_needs_active_ticket() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);

        assert_eq!(game.start_draw().await, Err(GameError::NoActiveTicket));
        assert_eq!(fixture.contract.writes(), 0);

        game.buy_ticket(1, 1).await.unwrap();
        game.start_draw().await.unwrap();
        assert_eq!(game.start_draw().await, Err(GameError::NoActiveTicket));
    }

    #[tokio::test]
    async fn test_nothing_to_decrypt_before_playing() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);

        let err = game.decrypt_score().await.unwrap_err();
        assert_eq!(err, GameError::NothingToDecrypt(Action::DecryptScore));
        assert_eq!(
            err.status_message(),
            "No encrypted score yet. Play a round first."
        );
        assert_eq!(
            game.decrypt_ticket().await.unwrap_err(),
            GameError::NothingToDecrypt(Action::DecryptTicket)
        );
        assert_eq!(
            game.decrypt_last_draw().await.unwrap_err().status_message(),
            "No draw to decrypt yet."
        );
        assert_eq!(fixture.wallet.prompts(), 0);
    }

    #[tokio::test]
    async fn test_disconnected_wallet() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);
        game.buy_ticket(3, 4).await.unwrap();
        fixture.wallet.disconnect();

        let err = game.decrypt_ticket().await.unwrap_err();
        assert_eq!(err, GameError::WalletNotConnected(Action::DecryptTicket));
        assert_eq!(err.status_message(), "Connect your wallet to decrypt.");
        let err = game.status().await.unwrap_err();
        assert_eq!(err, GameError::WalletNotConnected(Action::Status));
        assert_eq!(err.status_message(), "Connect your wallet first.");
        assert_eq!(
            game.buy_ticket(3, 4).await.unwrap_err().status_message(),
            "Connect your wallet to lock a ticket."
        );
        assert_eq!(fixture.oracle.user_decrypt_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_contract() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = GameClient::new(None, fixture.decryptor.clone());

        assert_eq!(
            game.buy_ticket(1, 2).await.unwrap_err(),
            GameError::ContractMissing(Action::BuyTicket)
        );
        assert_eq!(
            game.decrypt_score().await.unwrap_err().status_message(),
            "Contract address missing. Deploy before decrypting."
        );
    }

    #[tokio::test]
    async fn test_declined_signature() {
        let fixture = GameFixture::new(Prompt::Decline);
        let game = game(&fixture);
        game.buy_ticket(2, 3).await.unwrap();

        let err = game.decrypt_ticket().await.unwrap_err();
        assert_eq!(
            err,
            GameError::Decrypt {
                action: Action::DecryptTicket,
                source: DecryptError::UserDeclined
            }
        );
        assert_eq!(
            err.status_message(),
            "Signature request declined. Nothing was decrypted."
        );
        assert_eq!(fixture.oracle.user_decrypt_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_purchase() {
        let fixture = GameFixture::new(Prompt::Approve);
        let game = game(&fixture);
        fixture.contract.fail_next_write("insufficient funds");

        let err = game.buy_ticket(2, 3).await.unwrap_err();
        assert!(matches!(err, GameError::Transaction { action: Action::BuyTicket, .. }));
        assert_eq!(err.status_message(), "Failed to buy ticket");
    }
}
