//! Scratch card core - wallet and chain connectivity for the lottery client
//!
//! This library owns the connection to an injected wallet: which chain it
//! is on, which account is active, and the execution context that contract
//! calls are made through.

pub mod config;
pub mod error;
pub mod gate;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::{ChainConfig, NativeCurrency};
pub use error::{ChainError, ErrorCategory, Result};
pub use gate::{ChainGate, ExecutionContext};
pub use provider::{AddChainParams, JsonRpcProvider, WalletProvider};
pub use types::{
    format_ether, parse_ether, ChainChangeEvent, ChainId, ConnectionNotice, ConnectionState, Log,
    TransactionReceipt, TransactionRequest, TxHash,
};

pub use alloy_primitives::{Address, Bytes, B256, U256};
