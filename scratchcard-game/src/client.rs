use crate::config::GameConfig;
use crate::contract::LotteryContract;
use crate::error::{GameError, Result};
use crate::ledger::{PrizeLedgerView, PrizeTier};
use crate::outcome::PlayOutcome;
use crate::session::PlaySession;
use scratchcard_core::{ChainConfig, ChainGate, ConnectionState, WalletProvider};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Wires the gate, the ledger and the play session together for one wallet.
pub struct GameClient {
    gate: Arc<ChainGate>,
    ledger: Arc<PrizeLedgerView>,
    session: Arc<PlaySession>,
}

impl GameClient {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        chain: ChainConfig,
        game: GameConfig,
    ) -> Result<Self> {
        game.validate()?;
        let gate = Arc::new(ChainGate::new(provider, chain)?);
        let contract = LotteryContract::new(game.contract_address);
        let ledger = Arc::new(PrizeLedgerView::new(contract.clone(), game.clone()));
        let session = Arc::new(PlaySession::new(
            Arc::clone(&gate),
            Arc::clone(&ledger),
            contract,
            game,
        ));

        Ok(Self {
            gate,
            ledger,
            session,
        })
    }

    pub fn gate(&self) -> &Arc<ChainGate> {
        &self.gate
    }

    pub fn ledger(&self) -> &Arc<PrizeLedgerView> {
        &self.ledger
    }

    pub fn session(&self) -> &Arc<PlaySession> {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.gate.state()
    }

    /// Connects and loads the prize table and today's play count.
    pub async fn connect(&self) -> Result<ConnectionState> {
        let state = self.gate.connect().await?;
        self.ledger.reset_account();
        self.refresh().await?;
        Ok(state)
    }

    /// Asks for a network switch when the wallet is elsewhere, otherwise
    /// connects. After a successful switch the user still connects
    /// explicitly.
    pub async fn connect_or_switch(&self) -> Result<ConnectionState> {
        match self.gate.check_network().await {
            ConnectionState::WrongNetwork { .. } => {
                self.gate.request_switch().await;
                Ok(self.gate.state())
            }
            ConnectionState::Connected { .. } => Ok(self.gate.state()),
            ConnectionState::Disconnected => self.connect().await,
        }
    }

    pub async fn refresh(&self) -> Result<()> {
        let context = self.gate.execution_context().ok_or(GameError::NotConnected)?;
        self.ledger.refresh(&context).await;
        Ok(())
    }

    pub fn prizes(&self) -> Vec<PrizeTier> {
        self.ledger.tiers()
    }

    pub async fn play(&self) -> Result<PlayOutcome> {
        let context = self.gate.execution_context().ok_or(GameError::NotConnected)?;
        self.session.submit_play(&context).await
    }

    /// Follows wallet notifications and keeps the ledger's per-account data
    /// in step with the active account. Plays never rely on this task; the
    /// session checks the count's account itself.
    pub fn observe(&self) -> Vec<JoinHandle<()>> {
        let provider = self.gate.observe_provider();

        let mut states = self.gate.watch_state();
        let gate = Arc::clone(&self.gate);
        let ledger = Arc::clone(&self.ledger);
        let follower = tokio::spawn(async move {
            loop {
                match gate.execution_context() {
                    Some(context) if ledger.counted_account() != Some(context.account()) => {
                        tracing::info!("Reloading play count for {}", context.short_account());
                        ledger.fetch_played_today(&context, context.account()).await;
                    }
                    Some(_) => {}
                    None => ledger.reset_account(),
                }

                if states.changed().await.is_err() {
                    break;
                }
            }
        });

        vec![provider, follower]
    }
}
