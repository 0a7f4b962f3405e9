use crate::error::{ChainError, Result};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TxHash = B256;

/// Numeric chain identifier, rendered as `0x…` when talking to wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn hex(self) -> String {
        format!("{:#x}", self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        u64::from_str_radix(digits, 16)
            .map(ChainId)
            .map_err(|e| ChainError::decode(format!("Invalid chain id '{}': {}", raw, e)))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the session stands with respect to the wallet and the required chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    WrongNetwork { observed: ChainId },
    Connected { account: Address, chain_id: ChainId },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Connected { account, .. } => Some(*account),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::WrongNetwork { observed } => {
                write!(f, "wrong network (chain {})", observed)
            }
            ConnectionState::Connected { account, chain_id } => {
                write!(f, "connected as {} on chain {}", short_address(account), chain_id)
            }
        }
    }
}

/// Notifications pushed by the wallet for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainChangeEvent {
    ChainChanged(ChainId),
    AccountsChanged(Vec<Address>),
    Disconnect,
}

/// Human readable connectivity failure, kept for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionNotice {
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl ConnectionNotice {
    pub fn now(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            at: Utc::now(),
        }
    }
}

/// A value-bearing contract call handed to the wallet for signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Receipts without a status field predate EIP-658 and count as success.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status == U64::from(1u64))
    }
}

/// Formats wei as ether without trailing zeros, e.g. `0.05`.
pub fn format_ether(wei: U256) -> String {
    let formatted = alloy_primitives::utils::format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted,
    }
}

pub fn parse_ether(amount: &str) -> Result<U256> {
    alloy_primitives::utils::parse_ether(amount)
        .map_err(|e| ChainError::config(format!("Invalid ether amount '{}': {}", amount, e)))
}

/// `0x1234...abcd` form used in status lines.
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
