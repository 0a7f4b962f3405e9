//! In-memory wallet used by the unit tests of this workspace.

use crate::error::{ChainError, Result};
use crate::provider::{AddChainParams, WalletProvider};
use crate::types::{ChainChangeEvent, ChainId, TransactionReceipt, TransactionRequest, TxHash};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;

pub type CallHandler = Box<dyn Fn(Address, &Bytes) -> Result<Bytes> + Send + Sync>;
pub type SendHandler = Box<dyn Fn(&TransactionRequest) -> Result<TxHash> + Send + Sync>;

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn tx_hash(byte: u8) -> TxHash {
    TxHash::repeat_byte(byte)
}

pub struct MockWallet {
    chain_id: Mutex<ChainId>,
    fail_chain_reads: Mutex<bool>,
    accounts: Mutex<Vec<Address>>,
    reject_accounts: Mutex<bool>,
    known_chains: Mutex<HashSet<ChainId>>,
    reject_switch: Mutex<bool>,
    reject_add: Mutex<bool>,
    call_handler: Mutex<Option<CallHandler>>,
    send_handler: Mutex<Option<SendHandler>>,
    receipts: Mutex<HashMap<TxHash, TransactionReceipt>>,
    pending_polls: Mutex<usize>,
    requests: Mutex<Vec<&'static str>>,
    events: broadcast::Sender<ChainChangeEvent>,
}

impl MockWallet {
    pub fn new(chain_id: ChainId, accounts: Vec<Address>) -> Self {
        let (events, _) = broadcast::channel(256);
        let mut known_chains = HashSet::new();
        known_chains.insert(chain_id);

        Self {
            chain_id: Mutex::new(chain_id),
            fail_chain_reads: Mutex::new(false),
            accounts: Mutex::new(accounts),
            reject_accounts: Mutex::new(false),
            known_chains: Mutex::new(known_chains),
            reject_switch: Mutex::new(false),
            reject_add: Mutex::new(false),
            call_handler: Mutex::new(None),
            send_handler: Mutex::new(None),
            receipts: Mutex::new(HashMap::new()),
            pending_polls: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Simulates the user changing network inside the wallet.
    pub fn set_chain(&self, chain_id: ChainId) {
        *self.chain_id.lock() = chain_id;
        self.known_chains.lock().insert(chain_id);
        let _ = self.events.send(ChainChangeEvent::ChainChanged(chain_id));
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock() = accounts.clone();
        let _ = self.events.send(ChainChangeEvent::AccountsChanged(accounts));
    }

    pub fn emit(&self, event: ChainChangeEvent) {
        let _ = self.events.send(event);
    }

    pub fn forget_chain(&self, chain_id: ChainId) {
        self.known_chains.lock().remove(&chain_id);
    }

    pub fn fail_chain_reads(&self, fail: bool) {
        *self.fail_chain_reads.lock() = fail;
    }

    pub fn reject_accounts(&self, reject: bool) {
        *self.reject_accounts.lock() = reject;
    }

    pub fn reject_switch(&self, reject: bool) {
        *self.reject_switch.lock() = reject;
    }

    pub fn reject_add(&self, reject: bool) {
        *self.reject_add.lock() = reject;
    }

    pub fn on_call(&self, handler: impl Fn(Address, &Bytes) -> Result<Bytes> + Send + Sync + 'static) {
        *self.call_handler.lock() = Some(Box::new(handler));
    }

    pub fn on_send(
        &self,
        handler: impl Fn(&TransactionRequest) -> Result<TxHash> + Send + Sync + 'static,
    ) {
        *self.send_handler.lock() = Some(Box::new(handler));
    }

    pub fn insert_receipt(&self, receipt: TransactionReceipt) {
        self.receipts
            .lock()
            .insert(receipt.transaction_hash, receipt);
    }

    /// Number of receipt polls answered with "still pending" before the
    /// stored receipt is returned.
    pub fn set_pending_polls(&self, polls: usize) {
        *self.pending_polls.lock() = polls;
    }

    pub fn current_chain(&self) -> ChainId {
        *self.chain_id.lock()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|logged| **logged == method)
            .count()
    }

    fn record(&self, method: &'static str) {
        self.requests.lock().push(method);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn chain_id(&self) -> Result<ChainId> {
        self.record("chain_id");
        if *self.fail_chain_reads.lock() {
            return Err(ChainError::rpc(-32603, "chain id unavailable"));
        }
        Ok(*self.chain_id.lock())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.record("request_accounts");
        if *self.reject_accounts.lock() {
            return Err(ChainError::UserRejected("User rejected the request.".to_string()));
        }
        Ok(self.accounts.lock().clone())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        self.record("switch_chain");
        if *self.reject_switch.lock() {
            return Err(ChainError::UserRejected("User rejected the request.".to_string()));
        }
        if !self.known_chains.lock().contains(&chain_id) {
            return Err(ChainError::UnrecognizedChain(format!(
                "Unrecognized chain ID \"{}\"",
                chain_id.hex()
            )));
        }
        self.set_chain(chain_id);
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<()> {
        self.record("add_chain");
        if *self.reject_add.lock() {
            return Err(ChainError::UserRejected("User rejected the request.".to_string()));
        }
        let chain_id = ChainId::from_hex(&params.chain_id)?;
        self.known_chains.lock().insert(chain_id);
        Ok(())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.record("call");
        match self.call_handler.lock().as_ref() {
            Some(handler) => handler(to, &data),
            None => Err(ChainError::rpc(-32000, "execution reverted")),
        }
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash> {
        self.record("send_transaction");
        match self.send_handler.lock().as_ref() {
            Some(handler) => handler(&request),
            None => Err(ChainError::UserRejected("User denied transaction signature.".to_string())),
        }
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.record("transaction_receipt");
        {
            let mut pending = self.pending_polls.lock();
            if *pending > 0 {
                *pending -= 1;
                return Ok(None);
            }
        }
        Ok(self.receipts.lock().get(&hash).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChainChangeEvent> {
        self.events.subscribe()
    }
}
