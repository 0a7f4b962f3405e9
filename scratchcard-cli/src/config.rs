use alloy_primitives::Address;
use anyhow::Context;
use scratchcard_core::ChainConfig;
use scratchcard_game::{GameConfig, ScratchConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub chain: ChainConfig,
    pub game: GameConfig,
    pub scratch: ScratchConfig,
    /// Size of the simulated scratch surface.
    pub card_width: u32,
    pub card_height: u32,
    /// Interval for polling the node for chain and account changes.
    pub watch_interval_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            game: GameConfig::default(),
            scratch: ScratchConfig::default(),
            card_width: 300,
            card_height: 150,
            watch_interval_ms: 4_000,
        }
    }
}

impl CliConfig {
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scratchcard")
            .join("config.json")
    }

    /// Reads `path` if it exists, otherwise starts from the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn with_overrides(mut self, rpc_url: Option<String>, contract: Option<Address>) -> Self {
        if let Some(url) = rpc_url {
            self.chain.rpc_urls = vec![url];
        }
        if let Some(address) = contract {
            self.game.contract_address = address;
        }
        self
    }

    pub fn rpc_url(&self) -> anyhow::Result<&str> {
        self.chain
            .rpc_urls
            .first()
            .map(String::as_str)
            .context("no RPC URL configured")
    }
}
