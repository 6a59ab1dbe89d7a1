// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{send_tx_with_retry, LastDraw, Ticket, TxOutcome, TICKET_PRICE_WEI};
use alloy::providers::fillers::BlobGasFiller;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::fillers::{
        ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, Provider, ProviderBuilder, RootProvider},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use eyre::{bail, Result};
use once_cell::sync::Lazy;
use purechance_fhevm::{EncryptedInput, Handle};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

static NONCE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Errors worth resending a transaction for
const RETRYABLE_TX_ERRORS: &[&str] = &[
    "nonce too low",
    "replacement transaction underpriced",
    "connection",
    "timed out",
];

pub async fn next_pending_nonce<P>(provider: &P, from: Address) -> eyre::Result<u64>
where
    P: Provider<Ethereum> + Send + Sync,
{
    provider
        .get_transaction_count(from)
        .pending()
        .await
        .map_err(Into::into)
}

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract PureChance {
        error ZamaProtocolUnsupported();

        event TicketPurchased(address indexed player, bytes32 firstPick, bytes32 secondPick);
        event DrawCompleted(address indexed player, bytes32 firstDraw, bytes32 secondDraw, bytes32 reward);

        function TICKET_PRICE() external view returns (uint256);
        function confidentialProtocolId() external view returns (uint256);
        function buyTicket(bytes32 firstPickInput, bytes32 secondPickInput, bytes inputProof) external payable;
        function startDraw() external returns (bytes32);
        function getTicket(address player) external view returns (bytes32 firstPick, bytes32 secondPick, bool active);
        function getEncryptedScore(address player) external view returns (bytes32);
        function getLastDraw(address player) external view returns (bytes32 firstDraw, bytes32 secondDraw, bytes32 reward, uint256 blockNumber);
    }
}

/// Trait for read-only operations on the PureChance contract
#[async_trait]
pub trait PureChanceRead: Send + Sync {
    /// Address the contract is deployed at
    fn address(&self) -> Address;

    /// Get the encrypted ticket held by `player`
    async fn get_ticket(&self, player: Address) -> Result<Ticket>;

    /// Get the handle of `player`'s encrypted score
    async fn get_encrypted_score(&self, player: Address) -> Result<Handle>;

    /// Get the handles and block of `player`'s last draw
    async fn get_last_draw(&self, player: Address) -> Result<LastDraw>;

    /// Price of a ticket in wei as reported by the contract
    async fn ticket_price(&self) -> Result<U256>;

    /// Identifier of the confidential protocol deployment the contract uses
    async fn protocol_id(&self) -> Result<U256>;

    /// Get the latest block number
    async fn get_latest_block(&self) -> Result<u64>;
}

/// Trait for write operations on the PureChance contract
#[async_trait]
pub trait PureChanceWrite: Send + Sync {
    /// Buy a ticket with two encrypted picks, paying [`TICKET_PRICE_WEI`]
    async fn buy_ticket(&self, picks: &EncryptedInput) -> Result<TxOutcome>;

    /// Draw two numbers against the caller's active ticket
    async fn start_draw(&self) -> Result<TxOutcome>;
}

/// Everything a player needs from the contract
pub trait PureChanceGame: PureChanceRead + PureChanceWrite {}

impl<T: PureChanceRead + PureChanceWrite> PureChanceGame for T {}

/// Generic type to represent different provider types
pub trait ProviderType: Send {
    type Provider: Provider + Send + Sync + 'static;
}

/// Marker type for read-only provider
#[derive(Clone)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {
    type Provider = PureChanceReadOnlyProvider;
}
/// Marker type for read-write provider
#[derive(Clone)]
pub struct ReadWrite;
impl ProviderType for ReadWrite {
    type Provider = PureChanceWriteProvider;
}

/// Generic PureChance contract
#[derive(Clone)]
pub struct PureChanceContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    sender: Address,
    _marker: PhantomData<T>,
}

impl PureChanceContract<ReadWrite> {
    pub async fn new(
        http_rpc_url: &str,
        private_key: &str,
        contract_address: &str,
    ) -> Result<PureChanceContract<ReadWrite>> {
        PureChanceContractFactory::create_write(http_rpc_url, contract_address, private_key).await
    }

    pub fn get_provider(&self) -> Arc<PureChanceWriteProvider> {
        self.provider.clone()
    }

    /// Account transactions are sent from
    pub fn sender(&self) -> Address {
        self.sender
    }
}

impl PureChanceContract<ReadOnly> {
    pub async fn read_only(
        http_rpc_url: &str,
        contract_address: &str,
    ) -> Result<PureChanceContract<ReadOnly>> {
        PureChanceContractFactory::create_read(http_rpc_url, contract_address).await
    }

    pub fn get_provider(&self) -> Arc<PureChanceReadOnlyProvider> {
        self.provider.clone()
    }
}

/// Type alias for read-only provider
pub type PureChanceReadOnlyProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Type alias for read-write provider
pub type PureChanceWriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            JoinFill<
                Identity,
                JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
            >,
            WalletFiller<EthereumWallet>,
        >,
        NonceFiller,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// Type aliases for the two contract variants
pub type PureChanceReadContract = PureChanceContract<ReadOnly>;
pub type PureChanceWriteContract = PureChanceContract<ReadWrite>;

// Factory for creating contract instances
pub struct PureChanceContractFactory;

impl PureChanceContractFactory {
    /// Create a write-capable contract
    pub async fn create_write(
        http_rpc_url: &str,
        contract_address: &str,
        private_key: &str,
    ) -> Result<PureChanceContract<ReadWrite>> {
        let contract_address = contract_address.parse()?;

        let signer: PrivateKeySigner = private_key.trim().parse()?;
        let sender = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await?;

        Ok(PureChanceContract::<ReadWrite> {
            provider: Arc::new(provider),
            contract_address,
            sender,
            _marker: PhantomData,
        })
    }

    /// Create a read-only contract
    pub async fn create_read(
        http_rpc_url: &str,
        contract_address: &str,
    ) -> Result<PureChanceContract<ReadOnly>> {
        let contract_address = contract_address.parse()?;

        let provider = ProviderBuilder::new().connect(http_rpc_url).await?;

        Ok(PureChanceContract::<ReadOnly> {
            provider: Arc::new(provider),
            contract_address,
            sender: Address::ZERO,
            _marker: PhantomData,
        })
    }
}

// Implement PureChanceRead for any PureChanceContract regardless of provider type
#[async_trait]
impl<T: Send + Sync> PureChanceRead for PureChanceContract<T>
where
    T: ProviderType,
{
    fn address(&self) -> Address {
        self.contract_address
    }

    async fn get_ticket(&self, player: Address) -> Result<Ticket> {
        let contract = PureChance::new(self.contract_address, &self.provider);
        let ticket = contract.getTicket(player).call().await?;
        Ok(Ticket {
            first_pick: ticket.firstPick.into(),
            second_pick: ticket.secondPick.into(),
            active: ticket.active,
        })
    }

    async fn get_encrypted_score(&self, player: Address) -> Result<Handle> {
        let contract = PureChance::new(self.contract_address, &self.provider);
        let score = contract.getEncryptedScore(player).call().await?;
        Ok(score.into())
    }

    async fn get_last_draw(&self, player: Address) -> Result<LastDraw> {
        let contract = PureChance::new(self.contract_address, &self.provider);
        let draw = contract.getLastDraw(player).call().await?;
        Ok(LastDraw {
            first: draw.firstDraw.into(),
            second: draw.secondDraw.into(),
            reward: draw.reward.into(),
            block_number: draw.blockNumber.try_into()?,
        })
    }

    async fn ticket_price(&self) -> Result<U256> {
        let contract = PureChance::new(self.contract_address, &self.provider);
        let price = contract.TICKET_PRICE().call().await?;
        Ok(price)
    }

    async fn protocol_id(&self) -> Result<U256> {
        let contract = PureChance::new(self.contract_address, &self.provider);
        let id = contract.confidentialProtocolId().call().await?;
        Ok(id)
    }

    async fn get_latest_block(&self) -> Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }
}

// Implement PureChanceWrite only for contracts with ReadWrite marker
#[async_trait]
impl PureChanceWrite for PureChanceContract<ReadWrite> {
    async fn buy_ticket(&self, picks: &EncryptedInput) -> Result<TxOutcome> {
        let [first, second] = picks.handles.as_slice() else {
            bail!("a ticket needs exactly two encrypted picks, got {}", picks.handles.len());
        };
        let (first, second) = (*first.as_b256(), *second.as_b256());
        let proof = &picks.input_proof;

        let receipt = send_tx_with_retry("buyTicket", RETRYABLE_TX_ERRORS, || async move {
            let _guard = NONCE_LOCK.lock().await;
            let nonce = next_pending_nonce(&*self.provider, self.sender).await?;

            let contract = PureChance::new(self.contract_address, &self.provider);
            let builder = contract
                .buyTicket(first, second, proof.clone())
                .value(TICKET_PRICE_WEI)
                .nonce(nonce);
            let receipt = builder.send().await?.get_receipt().await?;
            Ok::<_, eyre::Report>(receipt)
        })
        .await?;

        info!("buyTicket mined in tx {}", receipt.transaction_hash);
        Ok(TxOutcome::from(&receipt))
    }

    async fn start_draw(&self) -> Result<TxOutcome> {
        let receipt = send_tx_with_retry("startDraw", RETRYABLE_TX_ERRORS, || async move {
            let _guard = NONCE_LOCK.lock().await;
            let nonce = next_pending_nonce(&*self.provider, self.sender).await?;

            let contract = PureChance::new(self.contract_address, &self.provider);
            let builder = contract.startDraw().nonce(nonce);
            let receipt = builder.send().await?.get_receipt().await?;
            Ok::<_, eyre::Report>(receipt)
        })
        .await?;

        info!("startDraw mined in tx {}", receipt.transaction_hash);
        Ok(TxOutcome::from(&receipt))
    }
}
