//! Wallet provider seam.
//!
//! Everything the client needs from an injected wallet (account access,
//! network switching, contract calls and change notifications) goes through
//! [`WalletProvider`], so the state machines above it can run against a real
//! node or an in-memory fake.

pub mod rpc;

pub use rpc::JsonRpcProvider;

use crate::config::{ChainConfig, NativeCurrency};
use crate::error::Result;
use crate::types::{ChainChangeEvent, ChainId, TransactionReceipt, TransactionRequest, TxHash};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// Parameters of `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
}

impl From<&ChainConfig> for AddChainParams {
    fn from(config: &ChainConfig) -> Self {
        Self {
            chain_id: config.chain_id.hex(),
            chain_name: config.chain_name.clone(),
            native_currency: config.native_currency.clone(),
            rpc_urls: config.rpc_urls.clone(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Chain the wallet is currently pointed at.
    async fn chain_id(&self) -> Result<ChainId>;

    /// Asks the user for account access; the first entry is the active account.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Fails with `ChainError::UnrecognizedChain` when the wallet has never
    /// seen `chain_id`.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<()>;

    async fn add_chain(&self, params: &AddChainParams) -> Result<()>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash>;

    /// `None` while the transaction is still pending.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>>;

    fn subscribe(&self) -> broadcast::Receiver<ChainChangeEvent>;
}
