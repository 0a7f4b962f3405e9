use crate::error::{GameError, Result};
use alloy_primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// 0.01 ether.
const DEFAULT_STAKE_WEI: u64 = 10_000_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub contract_address: Address,
    pub stake_wei: U256,
    pub daily_play_limit: u32,
    /// Highest tier index; reserved for "no prize".
    pub no_prize_tier: u32,
    /// Divisor turning contract probability units into percent.
    pub probability_scale: u32,
    pub receipt_poll_interval_ms: u64,
    pub confirmation_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            contract_address: address!("a12FFC0499C29ac21e795cFb5EE46e7Db2940Dc4"),
            stake_wei: U256::from(DEFAULT_STAKE_WEI),
            daily_play_limit: 30,
            no_prize_tier: 6,
            probability_scale: 100,
            receipt_poll_interval_ms: 1_000,
            confirmation_timeout_secs: 300,
        }
    }
}

impl GameConfig {
    pub fn tiers(&self) -> RangeInclusive<u32> {
        0..=self.no_prize_tier
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract_address == Address::ZERO {
            return Err(GameError::config("Contract address cannot be zero"));
        }

        if self.stake_wei.is_zero() {
            return Err(GameError::config("Stake must be greater than 0"));
        }

        if self.no_prize_tier == 0 {
            return Err(GameError::config("At least one prize tier is required"));
        }

        if self.probability_scale == 0 {
            return Err(GameError::config("Probability scale must be greater than 0"));
        }

        if self.receipt_poll_interval_ms == 0 {
            return Err(GameError::config("Receipt poll interval must be greater than 0"));
        }

        Ok(())
    }
}

/// Geometry and timing of the scratch-off surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchConfig {
    pub brush_radius: f32,
    pub reveal_threshold: f64,
    pub fade_duration_ms: u64,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            brush_radius: 20.0,
            reveal_threshold: 0.5,
            fade_duration_ms: 400,
        }
    }
}

impl ScratchConfig {
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.brush_radius.is_nan() || self.brush_radius <= 0.0 {
            return Err(GameError::config("Brush radius must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.reveal_threshold) || self.reveal_threshold == 0.0 {
            return Err(GameError::config("Reveal threshold must be in (0, 1]"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiers().count(), 7);
        assert_eq!(
            scratchcard_core::format_ether(config.stake_wei),
            "0.01"
        );
    }

    #[test]
    fn test_validate_rejects_zero_stake() {
        let config = GameConfig {
            stake_wei: U256::ZERO,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scratch_config_bounds() {
        assert!(ScratchConfig::default().validate().is_ok());

        let config = ScratchConfig {
            reveal_threshold: 1.5,
            ..ScratchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ScratchConfig {
            brush_radius: 0.0,
            ..ScratchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
