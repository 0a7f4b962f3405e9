use crate::config::GameConfig;
use crate::contract::{LotteryContract, RawPrize};
use crate::error::{GameError, Result};
use alloy_primitives::{Address, U256};
use parking_lot::RwLock;
use scratchcard_core::{format_ether, ExecutionContext};
use serde::{Deserialize, Serialize};

/// Inventory of one prize tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTier {
    pub tier: u32,
    pub amount_wei: U256,
    pub remaining: u64,
    pub total: u64,
    /// Contract-native fixed point; divide by the probability scale for percent.
    pub probability_basis_points: u32,
}

impl PrizeTier {
    pub fn from_raw(tier: u32, raw: RawPrize, no_prize_tier: u32) -> Result<Self> {
        let remaining = to_u64(raw.left, "left")?;
        let total = to_u64(raw.total, "total")?;
        let probability_basis_points = u32::try_from(to_u64(raw.probability, "probability")?)
            .map_err(|_| GameError::invalid_response("probability out of range"))?;

        if total == 0 {
            return Err(GameError::invalid_response(format!("tier {} has zero total", tier)));
        }
        if remaining > total {
            return Err(GameError::invalid_response(format!(
                "tier {} reports {} remaining of {}",
                tier, remaining, total
            )));
        }

        let amount_wei = if tier == no_prize_tier {
            U256::ZERO
        } else {
            raw.amount
        };

        Ok(Self {
            tier,
            amount_wei,
            remaining,
            total,
            probability_basis_points,
        })
    }

    pub fn probability_percent(&self, scale: u32) -> f64 {
        f64::from(self.probability_basis_points) / f64::from(scale)
    }

    pub fn amount_ether(&self) -> String {
        format_ether(self.amount_wei)
    }

    pub fn is_sold_out(&self) -> bool {
        self.remaining == 0
    }
}

fn to_u64(value: U256, field: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(GameError::invalid_response(format!("{} does not fit in 64 bits", field)));
    }
    Ok(value.as_limbs()[0])
}

/// Read model over the contract's prize inventory and the player's daily
/// count. Holds the last fetched values only; every fetch replaces them.
/// The daily count is stored with the account it was read for.
pub struct PrizeLedgerView {
    contract: LotteryContract,
    config: GameConfig,
    tiers: RwLock<Vec<PrizeTier>>,
    played_today: RwLock<Option<(Address, u32)>>,
}

impl PrizeLedgerView {
    pub fn new(contract: LotteryContract, config: GameConfig) -> Self {
        Self {
            contract,
            config,
            tiers: RwLock::new(Vec::new()),
            played_today: RwLock::new(None),
        }
    }

    /// Queries every tier in order. A tier that fails to load is logged and
    /// left out; the others are still returned.
    pub async fn fetch_all(&self, context: &ExecutionContext) -> Vec<PrizeTier> {
        let mut fetched = Vec::new();

        for tier in self.config.tiers() {
            let loaded = match self.contract.prize(context, tier).await {
                Ok(raw) => PrizeTier::from_raw(tier, raw, self.config.no_prize_tier),
                Err(e) => Err(e),
            };

            match loaded {
                Ok(prize) => fetched.push(prize),
                Err(e) => tracing::error!("Unable to load prize tier {}: {}", tier, e),
            }
        }

        tracing::debug!("Loaded {} prize tiers", fetched.len());
        *self.tiers.write() = fetched.clone();
        fetched
    }

    /// On failure the last known count for `account` is kept, never reset
    /// to zero. A count held for another account is dropped.
    pub async fn fetch_played_today(
        &self,
        context: &ExecutionContext,
        account: Address,
    ) -> Option<u32> {
        match self.contract.played_today(context, account).await {
            Ok(count) => {
                *self.played_today.write() = Some((account, count));
                Some(count)
            }
            Err(e) => {
                tracing::error!("Unable to load today's play count for {}: {}", account, e);
                let mut played = self.played_today.write();
                match *played {
                    Some((counted, count)) if counted == account => Some(count),
                    _ => {
                        *played = None;
                        None
                    }
                }
            }
        }
    }

    pub async fn refresh(&self, context: &ExecutionContext) {
        self.fetch_all(context).await;
        self.fetch_played_today(context, context.account()).await;
    }

    pub fn tiers(&self) -> Vec<PrizeTier> {
        self.tiers.read().clone()
    }

    pub fn tier(&self, tier: u32) -> Option<PrizeTier> {
        self.tiers.read().iter().find(|p| p.tier == tier).cloned()
    }

    /// The account the held daily count belongs to.
    pub fn counted_account(&self) -> Option<Address> {
        (*self.played_today.read()).map(|(account, _)| account)
    }

    /// Last fetched count, whichever account it was read for.
    pub fn played_today(&self) -> Option<u32> {
        (*self.played_today.read()).map(|(_, count)| count)
    }

    /// Count for `account`, or `None` when the held count is someone else's.
    pub fn played_today_for(&self, account: Address) -> Option<u32> {
        match *self.played_today.read() {
            Some((counted, count)) if counted == account => Some(count),
            _ => None,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.config.daily_play_limit
    }

    /// Unknown counts are treated as zero; the contract enforces the cap.
    pub fn plays_left(&self) -> u32 {
        self.remaining_after(self.played_today())
    }

    pub fn plays_left_for(&self, account: Address) -> u32 {
        self.remaining_after(self.played_today_for(account))
    }

    pub fn limit_reached_for(&self, account: Address) -> bool {
        self.plays_left_for(account) == 0
    }

    fn remaining_after(&self, played: Option<u32>) -> u32 {
        self.config
            .daily_play_limit
            .saturating_sub(played.unwrap_or(0))
    }

    pub fn probability_scale(&self) -> u32 {
        self.config.probability_scale
    }

    /// Forgets the per-account count, e.g. after the account changes.
    pub fn reset_account(&self) {
        *self.played_today.write() = None;
    }
}
