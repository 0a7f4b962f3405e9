use scratchcard_core::{ErrorCategory, TxHash};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Chain error: {0}")]
    Chain(#[from] scratchcard_core::ChainError),

    #[error("Wallet not connected to the required network")]
    NotConnected,

    #[error("Daily play limit reached: {played}/{limit}")]
    DailyLimitReached { played: u32, limit: u32 },

    #[error("A play transaction is already in flight")]
    TransactionInFlight,

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    #[error("Transaction {hash} was not confirmed within {waited_secs}s")]
    ConfirmationTimeout { hash: TxHash, waited_secs: u64 },

    #[error("Invalid contract response: {0}")]
    InvalidResponse(String),

    #[error("Invalid game configuration: {0}")]
    Config(String),
}

impl GameError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GameError::Chain(inner) => inner.category(),
            GameError::NotConnected => ErrorCategory::Connectivity,
            GameError::DailyLimitReached { .. }
            | GameError::TransactionInFlight
            | GameError::Reverted(_)
            | GameError::ConfirmationTimeout { .. } => ErrorCategory::Transaction,
            GameError::InvalidResponse(_) => ErrorCategory::Read,
            GameError::Config(_) => ErrorCategory::Environment,
        }
    }
}
