use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

/// Coarse classes used by callers to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No usable wallet at all; reported once, never retried.
    Environment,
    /// Network or account problems the user can fix and retry.
    Connectivity,
    /// Contract reads; callers degrade to partial or stale data.
    Read,
    /// Submission, confirmation or revert of a paid call.
    Transaction,
}

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("No wallet provider detected")]
    ProviderMissing,

    #[error("Wrong network: connected to chain {observed}, expected {required}")]
    WrongNetwork { observed: u64, required: u64 },

    #[error("Wallet does not recognize chain {0}")]
    UnrecognizedChain(String),

    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("No accounts returned by wallet")]
    NoAccounts,

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ChainError {
    pub fn wallet(msg: impl Into<String>) -> Self {
        Self::Wallet(msg.into())
    }

    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChainError::ProviderMissing => ErrorCategory::Environment,
            ChainError::WrongNetwork { .. }
            | ChainError::UnrecognizedChain(_)
            | ChainError::UserRejected(_)
            | ChainError::NotConnected
            | ChainError::NoAccounts
            | ChainError::Wallet(_) => ErrorCategory::Connectivity,
            ChainError::Rpc { .. }
            | ChainError::Transport(_)
            | ChainError::Serialization(_)
            | ChainError::Decode(_) => ErrorCategory::Read,
            ChainError::Config(_) => ErrorCategory::Environment,
        }
    }

    /// True when the wallet reported that the user dismissed the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ChainError::UserRejected(_))
    }
}
