// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use eyre::{bail, eyre, Result};
use purechance_contracts::{
    reward_for, LastDraw, PureChanceRead, PureChanceWrite, Ticket, TxOutcome, MAX_NUMBER,
    MIN_NUMBER, TICKET_PRICE_WEI,
};
use purechance_fhevm::{local::LocalOracle, ConfidentialClient, EncryptedInput, FheType, Handle};
use rand::Rng;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

#[derive(Default, Clone, Copy)]
struct PlayerState {
    ticket: Ticket,
    score: Handle,
    last_draw: LastDraw,
}

#[derive(Default)]
struct ChainState {
    players: HashMap<Address, PlayerState>,
    block: u64,
    scripted_draws: VecDeque<[u8; 2]>,
    write_failures: VecDeque<String>,
    writes: usize,
}

/// In-memory stand-in for the deployed PureChance contract.
///
/// Encrypted values live in a [`LocalOracle`]; the contract grants itself
/// and the player access to every handle it hands out, like the deployed
/// contract does.
#[derive(Clone)]
pub struct MockPureChance {
    address: Address,
    sender: Address,
    oracle: Arc<LocalOracle>,
    state: Arc<Mutex<ChainState>>,
}

impl MockPureChance {
    pub fn new(address: Address, sender: Address, oracle: Arc<LocalOracle>) -> Self {
        Self {
            address,
            sender,
            oracle,
            state: Arc::new(Mutex::new(ChainState::default())),
        }
    }

    /// Make the next draw produce these numbers instead of random ones
    pub fn script_draw(&self, first: u8, second: u8) {
        self.state().scripted_draws.push_back([first, second]);
    }

    /// Make the next write fail with `message`
    pub fn fail_next_write(&self, message: &str) {
        self.state().write_failures.push_back(message.to_string());
    }

    /// Transactions mined so far
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn player(&self, player: Address) -> PlayerState {
        self.state().players.get(&player).copied().unwrap_or_default()
    }

    fn encrypt_and_share(&self, fhe_type: FheType, value: u64) -> Handle {
        let handle = self.oracle.trivial_encrypt(fhe_type.clear(value));
        self.oracle.allow(handle, self.address);
        self.oracle.allow(handle, self.sender);
        handle
    }

    fn plaintext_u8(&self, handle: &Handle) -> Result<u8> {
        let value = self
            .oracle
            .plaintext(handle)
            .ok_or_else(|| eyre!("unknown handle {}", handle))?;
        Ok(value.value.saturating_to::<u8>())
    }

    fn mine(state: &mut ChainState) -> Result<TxOutcome> {
        if let Some(message) = state.write_failures.pop_front() {
            bail!("{}", message);
        }
        state.block += 1;
        state.writes += 1;
        Ok(TxOutcome {
            tx_hash: keccak256(state.block.to_be_bytes()),
            block_number: Some(state.block),
            success: true,
        })
    }

    fn next_draw(state: &mut ChainState) -> [u8; 2] {
        state.scripted_draws.pop_front().unwrap_or_else(|| {
            let mut rng = rand::thread_rng();
            [
                rng.gen_range(MIN_NUMBER..=MAX_NUMBER),
                rng.gen_range(MIN_NUMBER..=MAX_NUMBER),
            ]
        })
    }
}

#[async_trait]
impl PureChanceRead for MockPureChance {
    fn address(&self) -> Address {
        self.address
    }

    async fn get_ticket(&self, player: Address) -> Result<Ticket> {
        Ok(self.player(player).ticket)
    }

    async fn get_encrypted_score(&self, player: Address) -> Result<Handle> {
        Ok(self.player(player).score)
    }

    async fn get_last_draw(&self, player: Address) -> Result<LastDraw> {
        Ok(self.player(player).last_draw)
    }

    async fn ticket_price(&self) -> Result<U256> {
        Ok(TICKET_PRICE_WEI)
    }

    async fn protocol_id(&self) -> Result<U256> {
        Ok(U256::from(self.oracle.chain_id()))
    }

    async fn get_latest_block(&self) -> Result<u64> {
        Ok(self.state().block)
    }
}

#[async_trait]
impl PureChanceWrite for MockPureChance {
    async fn buy_ticket(&self, picks: &EncryptedInput) -> Result<TxOutcome> {
        let [first, second] = picks.handles.as_slice() else {
            bail!("execution reverted: expected two picks");
        };
        self.oracle
            .verify_input_proof(self.address, self.sender, &picks.handles, &picks.input_proof)
            .map_err(|e| eyre!("execution reverted: {}", e))?;
        for handle in [first, second] {
            if handle.fhe_type() != Some(FheType::Uint8) {
                bail!("execution reverted: pick {} is not an euint8", handle);
            }
            self.oracle.allow(*handle, self.address);
            self.oracle.allow(*handle, self.sender);
        }

        let existing = self.player(self.sender);
        let score = if existing.score.is_zero() {
            self.encrypt_and_share(FheType::Uint32, 0)
        } else {
            existing.score
        };

        let mut state = self.state();
        let outcome = Self::mine(&mut state)?;
        let player = state.players.entry(self.sender).or_default();
        player.ticket = Ticket {
            first_pick: *first,
            second_pick: *second,
            active: true,
        };
        player.score = score;
        debug!("Ticket bought by {}", self.sender);
        Ok(outcome)
    }

    async fn start_draw(&self) -> Result<TxOutcome> {
        let existing = self.player(self.sender);
        if !existing.ticket.active {
            bail!("execution reverted: no active ticket");
        }
        let picks = [
            self.plaintext_u8(&existing.ticket.first_pick)?,
            self.plaintext_u8(&existing.ticket.second_pick)?,
        ];
        let previous_score = self
            .oracle
            .plaintext(&existing.score)
            .map(|v| v.value.saturating_to::<u64>())
            .unwrap_or_default();

        let draw = Self::next_draw(&mut self.state());
        let reward = reward_for(picks, draw);
        let first = self.encrypt_and_share(FheType::Uint8, draw[0] as u64);
        let second = self.encrypt_and_share(FheType::Uint8, draw[1] as u64);
        let reward_handle = self.encrypt_and_share(FheType::Uint32, reward as u64);
        let score = self.encrypt_and_share(FheType::Uint32, previous_score + reward as u64);

        let mut state = self.state();
        let outcome = Self::mine(&mut state)?;
        let block = state.block;
        let player = state.players.entry(self.sender).or_default();
        player.ticket.active = false;
        player.score = score;
        player.last_draw = LastDraw {
            first,
            second,
            reward: reward_handle,
            block_number: block,
        };
        debug!("Draw {:?} for picks {:?} pays {}", draw, picks, reward);
        Ok(outcome)
    }
}
