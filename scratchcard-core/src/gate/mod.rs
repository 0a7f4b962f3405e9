//! Wallet connectivity and network state machine.
//!
//! `ChainGate` is the only writer of the session's [`ConnectionState`] and of
//! the [`ExecutionContext`] derived from it. Everything else reads.

pub mod context;

pub use context::ExecutionContext;

use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::provider::{AddChainParams, WalletProvider};
use crate::types::{ChainChangeEvent, ChainId, ConnectionNotice, ConnectionState};
use alloy_primitives::Address;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

struct GateInner {
    state: ConnectionState,
    context: Option<ExecutionContext>,
    /// Bumped whenever the context is issued or revoked.
    generation: u64,
    last_notice: Option<ConnectionNotice>,
}

pub struct ChainGate {
    provider: Arc<dyn WalletProvider>,
    config: ChainConfig,
    inner: RwLock<GateInner>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ChainGate {
    /// A missing provider is fatal for gameplay and is reported here, once.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: ChainConfig) -> Result<Self> {
        let Some(provider) = provider else {
            tracing::error!("No wallet provider detected; gameplay is unavailable");
            return Err(ChainError::ProviderMissing);
        };
        config.validate()?;

        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            provider,
            config,
            inner: RwLock::new(GateInner {
                state: ConnectionState::Disconnected,
                context: None,
                generation: 0,
                last_notice: None,
            }),
            state_tx,
        })
    }

    pub fn required_chain(&self) -> ChainId {
        self.config.chain_id
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read().state.clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn execution_context(&self) -> Option<ExecutionContext> {
        self.inner.read().context.clone()
    }

    /// False once the gate has revoked or replaced `context`.
    pub fn is_current(&self, context: &ExecutionContext) -> bool {
        let inner = self.inner.read();
        inner.context.is_some() && inner.generation == context.generation()
    }

    pub fn last_notice(&self) -> Option<ConnectionNotice> {
        self.inner.read().last_notice.clone()
    }

    /// Raw change notifications from the wallet.
    pub fn events(&self) -> broadcast::Receiver<ChainChangeEvent> {
        self.provider.subscribe()
    }

    /// Re-evaluates the connection on every wallet notification until the
    /// provider goes away.
    pub fn observe_provider(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.provider.subscribe();
        let gate = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => gate.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} wallet notifications, re-checking network", skipped);
                        gate.check_network().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Wallet notification stream closed");
        })
    }

    pub async fn handle_event(&self, event: ChainChangeEvent) {
        tracing::debug!("Wallet notification: {:?}", event);

        match event {
            ChainChangeEvent::ChainChanged(_) => {
                self.check_network().await;
            }
            ChainChangeEvent::AccountsChanged(accounts) => match accounts.first() {
                None => self.revoke(ConnectionState::Disconnected, "Wallet locked or accounts removed"),
                Some(account) => self.rebind(*account),
            },
            ChainChangeEvent::Disconnect => {
                self.revoke(ConnectionState::Disconnected, "Wallet disconnected")
            }
        }
    }

    /// Reads the wallet's chain and applies the result. A failed read leaves
    /// the state as it was and records a notice.
    pub async fn check_network(&self) -> ConnectionState {
        if let Err(e) = self.evaluate_network().await {
            self.record_notice(format!("Unable to read network information: {}", e));
        }
        self.state()
    }

    async fn evaluate_network(&self) -> Result<ChainId> {
        let observed = self.provider.chain_id().await?;
        let required = self.config.chain_id;

        if observed != required {
            self.revoke(
                ConnectionState::WrongNetwork { observed },
                &format!(
                    "Please switch to {}. Current network id: {}",
                    self.config.chain_name, observed
                ),
            );
            return Ok(observed);
        }

        let mut inner = self.inner.write();
        if let ConnectionState::WrongNetwork { .. } = inner.state {
            inner.state = ConnectionState::Disconnected;
            self.state_tx.send_replace(inner.state.clone());
            tracing::info!("Wallet back on chain {}, connect to continue", required);
        }

        Ok(observed)
    }

    /// Asks the wallet to move to the required chain, registering it first if
    /// the wallet has never seen it. Returns whether the wallet ended up on
    /// the required chain.
    pub async fn request_switch(&self) -> bool {
        let required = self.config.chain_id;
        tracing::info!("Requesting switch to chain {} ({})", required, required.hex());

        match self.provider.switch_chain(required).await {
            Ok(()) => {}
            Err(ChainError::UnrecognizedChain(reason)) => {
                tracing::info!("Wallet does not know chain {}: {}", required, reason);
                let params = AddChainParams::from(&self.config);

                if let Err(e) = self.provider.add_chain(&params).await {
                    tracing::error!("Add chain error: {}", e);
                    self.record_notice(format!("Switching network failed: {}", e));
                    return false;
                }

                if let Err(e) = self.provider.switch_chain(required).await {
                    tracing::error!("Switch chain error after registering: {}", e);
                    self.record_notice(format!("Switching network failed: {}", e));
                    return false;
                }
            }
            Err(e) => {
                tracing::error!("Switch chain error: {}", e);
                self.record_notice(format!("Switching network failed: {}", e));
                return false;
            }
        }

        match self.evaluate_network().await {
            Ok(observed) => observed == required,
            Err(e) => {
                self.record_notice(format!("Unable to read network information: {}", e));
                false
            }
        }
    }

    /// Requests account access and issues an execution context. The wallet
    /// must already be on the required chain; callers switch first.
    pub async fn connect(&self) -> Result<ConnectionState> {
        let required = self.config.chain_id;
        let observed = match self.evaluate_network().await {
            Ok(observed) => observed,
            Err(e) => {
                self.record_notice(format!("Unable to read network information: {}", e));
                return Err(e);
            }
        };

        if observed != required {
            return Err(ChainError::WrongNetwork {
                observed: observed.value(),
                required: required.value(),
            });
        }

        let generation_before = self.inner.read().generation;

        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.record_notice(format!("Connecting wallet failed: {}", e));
                return Err(e);
            }
        };

        let Some(account) = accounts.first().copied() else {
            self.record_notice("Connecting wallet failed: no accounts available");
            return Err(ChainError::NoAccounts);
        };

        let mut inner = self.inner.write();
        if inner.generation != generation_before
            || matches!(inner.state, ConnectionState::WrongNetwork { .. })
        {
            // The wallet changed underneath us while the account prompt was open.
            drop(inner);
            self.record_notice("Connecting wallet failed: network changed during connection");
            return Err(ChainError::wallet("Network changed during connection"));
        }

        inner.generation += 1;
        inner.context = Some(ExecutionContext::new(
            account,
            required,
            inner.generation,
            Arc::clone(&self.provider),
        ));
        inner.state = ConnectionState::Connected {
            account,
            chain_id: required,
        };
        inner.last_notice = None;
        self.state_tx.send_replace(inner.state.clone());

        tracing::info!("Connected {} on chain {}", account, required);
        Ok(inner.state.clone())
    }

    /// Drops the context on the user's request.
    pub fn disconnect(&self) {
        self.revoke(ConnectionState::Disconnected, "Disconnected by user");
    }

    fn revoke(&self, next: ConnectionState, reason: &str) {
        let mut inner = self.inner.write();
        let had_context = inner.context.take().is_some();
        if had_context {
            inner.generation += 1;
        }

        if inner.state != next {
            tracing::warn!("Connection {} -> {}: {}", inner.state, next, reason);
            inner.state = next;
            self.state_tx.send_replace(inner.state.clone());
        }

        if matches!(inner.state, ConnectionState::WrongNetwork { .. }) || had_context {
            inner.last_notice = Some(ConnectionNotice::now(reason));
        }
    }

    fn rebind(&self, account: Address) {
        let mut inner = self.inner.write();
        let ConnectionState::Connected { chain_id, .. } = inner.state else {
            return;
        };
        if inner.state.account() == Some(account) {
            return;
        }

        inner.generation += 1;
        inner.context = Some(ExecutionContext::new(
            account,
            chain_id,
            inner.generation,
            Arc::clone(&self.provider),
        ));
        inner.state = ConnectionState::Connected { account, chain_id };
        self.state_tx.send_replace(inner.state.clone());

        tracing::info!("Active account changed to {}", account);
    }

    fn record_notice(&self, reason: impl Into<String>) {
        let notice = ConnectionNotice::now(reason);
        tracing::warn!("{} (at {})", notice.reason, notice.at);
        self.inner.write().last_notice = Some(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{account, MockWallet};
    use proptest::prelude::*;

    const OTHER_CHAIN: ChainId = ChainId(1);

    fn gate_with(wallet: Arc<MockWallet>) -> ChainGate {
        ChainGate::new(Some(wallet as Arc<dyn WalletProvider>), ChainConfig::sepolia()).unwrap()
    }

    #[test]
    fn test_missing_provider_is_fatal() {
        let err = ChainGate::new(None, ChainConfig::sepolia()).err().unwrap();
        assert!(matches!(err, ChainError::ProviderMissing));
        assert_eq!(err.category(), crate::ErrorCategory::Environment);
    }

    #[tokio::test]
    async fn test_connect_on_required_chain() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        let gate = gate_with(wallet.clone());

        let state = gate.connect().await.unwrap();
        assert_eq!(
            state,
            ConnectionState::Connected {
                account: account(1),
                chain_id: ChainId::SEPOLIA
            }
        );
        let context = gate.execution_context().unwrap();
        assert_eq!(context.account(), account(1));
        assert!(gate.is_current(&context));
        assert!(gate.last_notice().is_none());
    }

    #[tokio::test]
    async fn test_connect_refuses_wrong_network() {
        let wallet = Arc::new(MockWallet::new(OTHER_CHAIN, vec![account(1)]));
        let gate = gate_with(wallet.clone());

        let err = gate.connect().await.unwrap_err();
        assert!(matches!(err, ChainError::WrongNetwork { observed: 1, .. }));
        assert_eq!(gate.state(), ConnectionState::WrongNetwork { observed: OTHER_CHAIN });
        assert!(gate.execution_context().is_none());
        assert_eq!(wallet.request_count("request_accounts"), 0);
    }

    #[tokio::test]
    async fn test_rejected_account_request_stays_disconnected() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        wallet.reject_accounts(true);
        let gate = gate_with(wallet);

        assert!(gate.connect().await.unwrap_err().is_user_rejection());
        assert_eq!(gate.state(), ConnectionState::Disconnected);
        assert!(gate.last_notice().is_some());
    }

    #[tokio::test]
    async fn test_chain_change_revokes_context() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        let gate = gate_with(wallet.clone());
        gate.connect().await.unwrap();
        let context = gate.execution_context().unwrap();

        wallet.set_chain(OTHER_CHAIN);
        gate.handle_event(ChainChangeEvent::ChainChanged(OTHER_CHAIN)).await;

        assert_eq!(gate.state(), ConnectionState::WrongNetwork { observed: OTHER_CHAIN });
        assert!(gate.execution_context().is_none());
        assert!(!gate.is_current(&context));
        assert!(gate.last_notice().is_some());

        // Back on the right chain the user still has to connect again.
        wallet.set_chain(ChainId::SEPOLIA);
        gate.handle_event(ChainChangeEvent::ChainChanged(ChainId::SEPOLIA)).await;
        assert_eq!(gate.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_switch_registers_unknown_chain_then_retries() {
        let wallet = Arc::new(MockWallet::new(OTHER_CHAIN, vec![account(1)]));
        wallet.forget_chain(ChainId::SEPOLIA);
        let gate = gate_with(wallet.clone());
        gate.check_network().await;

        assert!(gate.request_switch().await);
        assert_eq!(wallet.request_count("switch_chain"), 2);
        assert_eq!(wallet.request_count("add_chain"), 1);
        assert_eq!(wallet.current_chain(), ChainId::SEPOLIA);
        assert_eq!(gate.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_switch_rejection_keeps_wrong_network() {
        let wallet = Arc::new(MockWallet::new(OTHER_CHAIN, vec![account(1)]));
        wallet.reject_switch(true);
        let gate = gate_with(wallet.clone());
        gate.check_network().await;

        assert!(!gate.request_switch().await);
        assert_eq!(gate.state(), ConnectionState::WrongNetwork { observed: OTHER_CHAIN });
        assert_eq!(wallet.request_count("add_chain"), 0);
        assert!(gate.last_notice().unwrap().reason.contains("Switching network failed"));
    }

    #[tokio::test]
    async fn test_rejected_add_chain_reports_failure() {
        let wallet = Arc::new(MockWallet::new(OTHER_CHAIN, vec![account(1)]));
        wallet.forget_chain(ChainId::SEPOLIA);
        wallet.reject_add(true);
        let gate = gate_with(wallet.clone());
        gate.check_network().await;

        assert!(!gate.request_switch().await);
        assert_eq!(wallet.request_count("switch_chain"), 1);
        assert_eq!(gate.state(), ConnectionState::WrongNetwork { observed: OTHER_CHAIN });
    }

    #[tokio::test]
    async fn test_account_changes() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        let gate = gate_with(wallet.clone());
        gate.connect().await.unwrap();
        let first = gate.execution_context().unwrap();

        gate.handle_event(ChainChangeEvent::AccountsChanged(vec![account(2)])).await;
        let second = gate.execution_context().unwrap();
        assert_eq!(second.account(), account(2));
        assert!(!gate.is_current(&first));
        assert!(gate.is_current(&second));

        gate.handle_event(ChainChangeEvent::AccountsChanged(vec![])).await;
        assert_eq!(gate.state(), ConnectionState::Disconnected);
        assert!(gate.execution_context().is_none());
    }

    #[tokio::test]
    async fn test_failed_chain_read_keeps_state() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        let gate = gate_with(wallet.clone());
        gate.connect().await.unwrap();

        wallet.fail_chain_reads(true);
        let state = gate.check_network().await;
        assert!(state.is_connected());
        assert!(gate.last_notice().is_some());
    }

    #[tokio::test]
    async fn test_observer_follows_wallet_notifications() {
        let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
        let gate = Arc::new(gate_with(wallet.clone()));
        let mut states = gate.watch_state();
        let observer = gate.observe_provider();
        gate.connect().await.unwrap();

        wallet.set_chain(OTHER_CHAIN);
        let observed = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                states.changed().await.unwrap();
                if let ConnectionState::WrongNetwork { observed } = *states.borrow() {
                    break observed;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(observed, OTHER_CHAIN);
        assert!(gate.execution_context().is_none());
        observer.abort();
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn prop_connected_only_on_required_chain(
            steps in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..24)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(1)]));
                let gate = gate_with(wallet.clone());

                for (on_required, try_connect) in steps {
                    let chain = if on_required { ChainId::SEPOLIA } else { OTHER_CHAIN };
                    wallet.set_chain(chain);
                    gate.handle_event(ChainChangeEvent::ChainChanged(chain)).await;
                    if try_connect {
                        let _ = gate.connect().await;
                    }

                    let latest = wallet.current_chain();
                    match gate.state() {
                        ConnectionState::Connected { chain_id, .. } => {
                            prop_assert_eq!(chain_id, latest);
                            prop_assert_eq!(latest, ChainId::SEPOLIA);
                            prop_assert!(gate.execution_context().is_some());
                        }
                        ConnectionState::WrongNetwork { observed } => {
                            prop_assert_eq!(observed, latest);
                            prop_assert!(gate.execution_context().is_none());
                        }
                        ConnectionState::Disconnected => {
                            prop_assert!(gate.execution_context().is_none());
                        }
                    }
                }
                Ok(())
            })?;
        }
    }
}
