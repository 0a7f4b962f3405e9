use crate::config::GameConfig;
use crate::contract::LotteryContract;
use crate::error::{GameError, Result};
use crate::ledger::PrizeLedgerView;
use crate::outcome::{resolve_outcome, PlayOutcome, SharePayload};
use parking_lot::RwLock;
use scratchcard_core::{ChainGate, ExecutionContext, TransactionReceipt, TxHash};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Lifecycle of the single play transaction a session may own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    Submitting,
    AwaitingConfirmation(TxHash),
    Confirmed(PlayOutcome),
    Failed(String),
}

impl TransactionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TransactionState::Submitting | TransactionState::AwaitingConfirmation(_)
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Idle => write!(f, "idle"),
            TransactionState::Submitting => write!(f, "submitting"),
            TransactionState::AwaitingConfirmation(hash) => write!(f, "awaiting confirmation of {}", hash),
            TransactionState::Confirmed(outcome) => write!(f, "confirmed (tier {})", outcome.tier),
            TransactionState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Submits paid plays and turns their receipts into outcomes. At most one
/// play is outstanding at a time.
pub struct PlaySession {
    id: Uuid,
    gate: Arc<ChainGate>,
    ledger: Arc<PrizeLedgerView>,
    contract: LotteryContract,
    config: GameConfig,
    state_tx: watch::Sender<TransactionState>,
    last_outcome: RwLock<Option<PlayOutcome>>,
}

impl PlaySession {
    pub fn new(
        gate: Arc<ChainGate>,
        ledger: Arc<PrizeLedgerView>,
        contract: LotteryContract,
        config: GameConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(TransactionState::Idle);
        let id = Uuid::new_v4();
        tracing::debug!("Play session {} created for contract {}", id, contract.address());

        Self {
            id,
            gate,
            ledger,
            contract,
            config,
            state_tx,
            last_outcome: RwLock::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state_tx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<TransactionState> {
        self.state_tx.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state_tx.borrow().is_in_flight()
    }

    pub fn last_outcome(&self) -> Option<PlayOutcome> {
        *self.last_outcome.read()
    }

    pub fn share_payload(&self, symbol: &str) -> Option<SharePayload> {
        let outcome = self.last_outcome()?;
        SharePayload::for_outcome(&outcome, self.config.no_prize_tier, symbol)
    }

    /// Plays once with `context` and waits for the result.
    ///
    /// Precondition failures are returned without touching the session
    /// state or sending a transaction. Once submission starts, every failure ends in
    /// [`TransactionState::Failed`] and the previous outcome is kept.
    pub async fn submit_play(&self, context: &ExecutionContext) -> Result<PlayOutcome> {
        if self.is_pending() {
            return Err(GameError::TransactionInFlight);
        }
        if !self.gate.is_current(context) {
            return Err(GameError::NotConnected);
        }
        self.check_daily_limit(context).await?;

        let claimed = self.state_tx.send_if_modified(|state| {
            if state.is_in_flight() {
                return false;
            }
            *state = TransactionState::Submitting;
            true
        });
        if !claimed {
            return Err(GameError::TransactionInFlight);
        }

        tracing::info!(
            "Session {}: {} plays for {} wei",
            self.id,
            context.short_account(),
            self.config.stake_wei
        );

        match self.play_and_resolve(context).await {
            Ok(outcome) => {
                *self.last_outcome.write() = Some(outcome);
                self.state_tx.send_replace(TransactionState::Confirmed(outcome));
                tracing::info!(
                    "Session {}: settled on tier {} ({} wei)",
                    self.id,
                    outcome.tier,
                    outcome.amount_wei
                );
                self.refresh_ledger().await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Session {}: play failed: {}", self.id, e);
                self.state_tx.send_replace(TransactionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Only a count read for the context's account is trusted; otherwise it
    /// is fetched first. An unreadable count lets the contract decide.
    async fn check_daily_limit(&self, context: &ExecutionContext) -> Result<()> {
        let account = context.account();
        let played = match self.ledger.played_today_for(account) {
            Some(played) => Some(played),
            None => self.ledger.fetch_played_today(context, account).await,
        };

        let limit = self.ledger.daily_limit();
        match played {
            Some(played) if played >= limit => Err(GameError::DailyLimitReached { played, limit }),
            _ => Ok(()),
        }
    }

    async fn play_and_resolve(&self, context: &ExecutionContext) -> Result<PlayOutcome> {
        let hash = self.contract.play(context, self.config.stake_wei).await?;
        self.state_tx
            .send_replace(TransactionState::AwaitingConfirmation(hash));
        tracing::info!("Session {}: submitted {}", self.id, hash);

        let receipt = self.await_receipt(context, hash).await?;
        if !receipt.succeeded() {
            return Err(GameError::Reverted(hash));
        }

        let resolution = resolve_outcome(&self.contract, &receipt.logs, self.config.no_prize_tier);
        if resolution.is_fallback() {
            tracing::warn!(
                "Session {}: receipt {} carries no settlement event, reporting no prize",
                self.id,
                hash
            );
        }
        Ok(resolution.outcome())
    }

    /// Polls until the receipt shows up. Read errors while waiting are
    /// logged and retried; the transaction is already broadcast.
    async fn await_receipt(&self, context: &ExecutionContext, hash: TxHash) -> Result<TransactionReceipt> {
        let timeout = self.config.confirmation_timeout();
        let interval = self.config.poll_interval();

        let polling = async {
            loop {
                match context.receipt(hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Receipt lookup for {} failed: {}", hash, e),
                }
                tokio::time::sleep(interval).await;
            }
        };

        tokio::time::timeout(timeout, polling)
            .await
            .map_err(|_| GameError::ConfirmationTimeout {
                hash,
                waited_secs: timeout.as_secs(),
            })
    }

    /// Reads through whatever context the gate holds now; the one used for
    /// the play may have been revoked while it was pending.
    async fn refresh_ledger(&self) {
        match self.gate.execution_context() {
            Some(current) => self.ledger.refresh(&current).await,
            None => tracing::debug!(
                "Session {}: wallet no longer connected, skipping ledger refresh",
                self.id
            ),
        }
    }
}
