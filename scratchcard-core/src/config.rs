use crate::error::{ChainError, Result};
use crate::types::ChainId;
use serde::{Deserialize, Serialize};

/// The chain every gameplay call must target, plus the metadata a wallet
/// needs to register it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

impl ChainConfig {
    pub fn sepolia() -> Self {
        Self {
            chain_id: ChainId::SEPOLIA,
            chain_name: "Sepolia".to_string(),
            native_currency: NativeCurrency {
                name: "SepoliaETH".to_string(),
                symbol: "SEP".to_string(),
                decimals: 18,
            },
            rpc_urls: vec!["https://sepolia.infura.io/v3/".to_string()],
        }
    }

    /// A local development chain (anvil / hardhat defaults).
    pub fn local(chain_id: u64, rpc_url: &str) -> Self {
        Self {
            chain_id: ChainId(chain_id),
            chain_name: "Local".to_string(),
            native_currency: NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_urls: vec![rpc_url.to_string()],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id.value() == 0 {
            return Err(ChainError::config("Chain id cannot be zero"));
        }

        if self.rpc_urls.is_empty() || self.rpc_urls.iter().any(|url| url.is_empty()) {
            return Err(ChainError::config("At least one non-empty RPC URL is required"));
        }

        if self.native_currency.symbol.is_empty() {
            return Err(ChainError::config("Native currency symbol cannot be empty"));
        }

        Ok(())
    }
}
