use crate::error::Result;
use crate::provider::WalletProvider;
use crate::types::{short_address, ChainId, TransactionReceipt, TransactionRequest, TxHash};
use alloy_primitives::{Address, Bytes, U256};
use std::fmt;
use std::sync::Arc;

/// Account-scoped, chain-bound handle used for every contract interaction.
///
/// Only [`ChainGate`](super::ChainGate) hands these out. Each one carries the
/// gate generation it was issued under, so holders can ask the gate whether
/// it is still valid before doing anything irreversible.
#[derive(Clone)]
pub struct ExecutionContext {
    account: Address,
    chain_id: ChainId,
    generation: u64,
    provider: Arc<dyn WalletProvider>,
}

impl ExecutionContext {
    pub(crate) fn new(
        account: Address,
        chain_id: ChainId,
        generation: u64,
        provider: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            account,
            chain_id,
            generation,
            provider,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn short_account(&self) -> String {
        short_address(&self.account)
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.provider.call(to, data).await
    }

    pub async fn send(&self, to: Address, value: U256, data: Bytes) -> Result<TxHash> {
        let request = TransactionRequest {
            from: self.account,
            to,
            value,
            data,
        };
        self.provider.send_transaction(request).await
    }

    pub async fn receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.provider.transaction_receipt(hash).await
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("generation", &self.generation)
            .finish()
    }
}
