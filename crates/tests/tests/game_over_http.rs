// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use purechance_contracts::reward_for;
use purechance_decryption::{
    DecryptError, DecryptionConfig, UserDecryptor, WalletConnection, WalletSigner,
};
use purechance_fhevm::{
    local::LocalOracle, relayer::HttpRelayer, strip_hex_marker, ClearValue, ConfidentialClient,
    DecryptedValues, DecryptionDomain, EncryptedInput, FheType, HandleContractPair, RelayerError,
    UserDecryptRequest, USER_DECRYPT_DURATION_DAYS,
};
use purechance_game::{Action, GameClient, GameError, RevealedDraw, RevealedTicket};
use purechance_relayer_server::RelayerServerBuilder;
use purechance_test_helpers::{
    decryption_contract, game_address, local_oracle, MockPureChance, Prompt, TestConnection,
    TestWallet, TEST_CHAIN_ID,
};
use purechance_utils::unix_now;
use std::sync::{Arc, Mutex};

/// Records every user decryption request before passing it on
struct Recording {
    inner: Arc<dyn ConfidentialClient>,
    requests: Mutex<Vec<UserDecryptRequest>>,
}

impl Recording {
    fn new(inner: Arc<dyn ConfidentialClient>) -> Self {
        Self {
            inner,
            requests: Mutex::new(vec![]),
        }
    }

    fn requests(&self) -> Vec<UserDecryptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfidentialClient for Recording {
    fn decryption_domain(&self) -> DecryptionDomain {
        self.inner.decryption_domain()
    }

    fn chain_id(&self) -> u64 {
        self.inner.chain_id()
    }

    async fn encrypt_input(
        &self,
        contract: Address,
        user: Address,
        values: &[ClearValue],
    ) -> Result<EncryptedInput, RelayerError> {
        self.inner.encrypt_input(contract, user, values).await
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, RelayerError> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.user_decrypt(request).await
    }
}

fn domain() -> DecryptionDomain {
    DecryptionDomain::new(TEST_CHAIN_ID, decryption_contract())
}

/// Serve `oracle` on a free local port and return its base url
fn start_relayer(oracle: Arc<LocalOracle>) -> Result<String> {
    let server = RelayerServerBuilder::new(oracle).with_port(0).build();
    let (running, addr) = server.bind()?;
    actix_web::rt::spawn(running);
    Ok(format!("http://{}", addr))
}

/// A player talking to the game through the http relayer
struct Table {
    oracle: Arc<LocalOracle>,
    relayer: Arc<Recording>,
    wallet: Arc<TestWallet>,
    contract: MockPureChance,
    game: GameClient,
}

impl Table {
    fn open(prompt: Prompt) -> Result<Self> {
        let oracle = local_oracle();
        let url = start_relayer(oracle.clone())?;
        let relayer = Arc::new(Recording::new(Arc::new(HttpRelayer::new(
            &url,
            TEST_CHAIN_ID,
            domain(),
        )?)));

        let wallet = TestWallet::new(prompt);
        let contract = MockPureChance::new(game_address(), wallet.address(), oracle.clone());
        let connection: Arc<dyn WalletConnection> = Arc::new(TestConnection(wallet.clone()));
        let decryptor = Arc::new(UserDecryptor::new(
            relayer.clone(),
            connection,
            DecryptionConfig {
                retry_delay_ms: 1,
                ..DecryptionConfig::default()
            },
        ));
        let game = GameClient::new(Some(Arc::new(contract.clone())), decryptor);

        Ok(Self {
            oracle,
            relayer,
            wallet,
            contract,
            game,
        })
    }
}

#[actix_web::test]
async fn test_ticket_round_trip() -> Result<()> {
    let table = Table::open(Prompt::Approve)?;

    let purchase = table.game.buy_ticket(5, 7).await?;
    assert!(purchase.outcome.success);
    assert_eq!(table.oracle.input_proof_calls(), 1);

    let ticket = table.game.decrypt_ticket().await?;
    assert_eq!(ticket, RevealedTicket { first: 5, second: 7 });
    assert_eq!(table.oracle.user_decrypt_calls(), 1);
    assert_eq!(table.wallet.prompts(), 1);
    Ok(())
}

#[actix_web::test]
async fn test_first_draw_score_equals_reward() -> Result<()> {
    for (draw, expected) in [([1, 2], 0), ([5, 3], 10), ([5, 7], 100)] {
        let table = Table::open(Prompt::Approve)?;
        table.game.buy_ticket(5, 7).await?;
        table.contract.script_draw(draw[0], draw[1]);

        table.game.start_draw().await?;
        let revealed = table.game.decrypt_last_draw().await?;
        assert_eq!(
            (revealed.first, revealed.second, revealed.reward),
            (
                draw[0].into(),
                draw[1].into(),
                reward_for([5, 7], draw).into()
            )
        );
        assert_eq!(revealed.reward, expected);

        // a zero score still has a handle to decrypt
        assert!(!table.game.status().await?.score.is_zero());
        assert_eq!(table.game.decrypt_score().await?, expected);

        // the ticket is spent
        assert_eq!(
            table.game.start_draw().await.unwrap_err(),
            GameError::NoActiveTicket
        );
    }
    Ok(())
}

#[actix_web::test]
async fn test_score_accumulates_over_rounds() -> Result<()> {
    let table = Table::open(Prompt::Approve)?;

    table.game.buy_ticket(2, 4).await?;
    table.contract.script_draw(2, 4);
    table.game.start_draw().await?;

    table.game.buy_ticket(1, 1).await?;
    table.contract.script_draw(9, 1);
    table.game.start_draw().await?;

    let draw = table.game.decrypt_last_draw().await?;
    assert_eq!(
        draw,
        RevealedDraw {
            first: 9,
            second: 1,
            reward: 10,
            block_number: draw.block_number,
        }
    );
    assert_eq!(table.game.decrypt_score().await?, 110);
    Ok(())
}

#[actix_web::test]
async fn test_unset_handles_never_reach_the_oracle() -> Result<()> {
    let table = Table::open(Prompt::Approve)?;

    assert_eq!(
        table.game.decrypt_score().await.unwrap_err(),
        GameError::NothingToDecrypt(Action::DecryptScore)
    );
    assert_eq!(
        table.game.decrypt_ticket().await.unwrap_err(),
        GameError::NothingToDecrypt(Action::DecryptTicket)
    );
    assert_eq!(
        table.game.decrypt_last_draw().await.unwrap_err(),
        GameError::NothingToDecrypt(Action::DecryptDraw)
    );

    assert_eq!(table.oracle.user_decrypt_calls(), 0);
    assert_eq!(table.wallet.prompts(), 0);
    Ok(())
}

#[actix_web::test]
async fn test_disconnected_wallet_never_reaches_the_oracle() -> Result<()> {
    let table = Table::open(Prompt::Approve)?;
    table.game.buy_ticket(3, 3).await?;
    table.wallet.disconnect();

    let err = table.game.decrypt_ticket().await.unwrap_err();
    assert_eq!(err, GameError::WalletNotConnected(Action::DecryptTicket));
    assert_eq!(err.status_message(), "Connect your wallet to decrypt.");
    assert!(table.relayer.requests().is_empty());
    assert_eq!(table.oracle.user_decrypt_calls(), 0);
    Ok(())
}

#[actix_web::test]
async fn test_declined_signature_reveals_nothing() -> Result<()> {
    let table = Table::open(Prompt::Decline)?;
    table.game.buy_ticket(3, 3).await?;

    let err = table.game.decrypt_ticket().await.unwrap_err();
    assert!(matches!(
        err,
        GameError::Decrypt {
            action: Action::DecryptTicket,
            source: DecryptError::UserDeclined,
        }
    ));
    assert_ne!(
        err.status_message(),
        GameError::Decrypt {
            action: Action::DecryptTicket,
            source: DecryptError::OracleUnavailable("down".to_string()),
        }
        .status_message()
    );
    assert_eq!(table.wallet.prompts(), 1);
    assert_eq!(table.oracle.user_decrypt_calls(), 0);
    Ok(())
}

#[actix_web::test]
async fn test_every_decryption_gets_a_fresh_seven_day_authorization() -> Result<()> {
    let table = Table::open(Prompt::Approve)?;
    table.game.buy_ticket(4, 8).await?;

    let before = unix_now()?;
    table.game.decrypt_ticket().await?;
    table.game.decrypt_ticket().await?;
    let after = unix_now()?;

    let requests = table.relayer.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].public_key, requests[1].public_key);
    for request in &requests {
        assert_eq!(request.duration_days, USER_DECRYPT_DURATION_DAYS);
        assert!(request.start_timestamp >= before && request.start_timestamp <= after);
        assert_eq!(request.contract_addresses, vec![game_address()]);
        assert_eq!(request.user_address, table.wallet.address());
    }
    assert_eq!(table.wallet.prompts(), 2);
    Ok(())
}

#[actix_web::test]
async fn test_relayer_refuses_expired_authorization() -> Result<()> {
    let oracle = local_oracle();
    let relayer = HttpRelayer::new(&start_relayer(oracle.clone())?, TEST_CHAIN_ID, domain())?;
    let wallet = TestWallet::approving();

    let handle = oracle.trivial_encrypt(FheType::Uint8.clear(6));
    oracle.allow(handle, wallet.address());
    oracle.allow(handle, game_address());

    let request_at = |start: u64| {
        let relayer = &relayer;
        let wallet = wallet.clone();
        async move {
            let keypair = relayer.generate_keypair();
            let authorization = relayer.create_eip712(
                &keypair.public_key_hex(),
                &[game_address()],
                start,
                USER_DECRYPT_DURATION_DAYS,
            )?;
            let signature = wallet.sign_authorization(&authorization).await?;
            Ok::<_, anyhow::Error>(UserDecryptRequest {
                pairs: vec![HandleContractPair {
                    handle,
                    contract_address: game_address(),
                }],
                private_key: keypair.private_key_hex(),
                public_key: keypair.public_key_hex(),
                signature: strip_hex_marker(&signature).to_string(),
                contract_addresses: vec![game_address()],
                user_address: wallet.address(),
                start_timestamp: start,
                duration_days: USER_DECRYPT_DURATION_DAYS,
            })
        }
    };

    let now = unix_now()?;
    let values = relayer.user_decrypt(request_at(now).await?).await?;
    assert_eq!(values[&handle], U256::from(6));

    let eight_days_ago = now - 8 * 24 * 60 * 60;
    let err = relayer
        .user_decrypt(request_at(eight_days_ago).await?)
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::Rejected { status: 403, .. }));
    assert!(!err.is_transient());
    assert_eq!(
        DecryptError::from(err.clone()),
        DecryptError::OracleRejected(err.to_string())
    );
    Ok(())
}
