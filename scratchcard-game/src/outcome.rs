use crate::contract::{LotteryContract, SettlementEvent};
use alloy_primitives::U256;
use scratchcard_core::{format_ether, Log};
use serde::{Deserialize, Serialize};

/// Result of one completed play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub tier: u32,
    pub amount_wei: U256,
}

impl PlayOutcome {
    /// Amounts reported for the no-prize tier are never trusted for display.
    pub fn settle(tier: u32, amount_wei: U256, no_prize_tier: u32) -> Self {
        let amount_wei = if tier == no_prize_tier {
            U256::ZERO
        } else {
            amount_wei
        };
        Self { tier, amount_wei }
    }

    pub fn no_prize(no_prize_tier: u32) -> Self {
        Self {
            tier: no_prize_tier,
            amount_wei: U256::ZERO,
        }
    }

    pub fn is_no_prize(&self, no_prize_tier: u32) -> bool {
        self.tier == no_prize_tier
    }

    pub fn amount_ether(&self) -> String {
        format_ether(self.amount_wei)
    }
}

/// How an outcome was obtained from a confirmed receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Settled {
        outcome: PlayOutcome,
        event: SettlementEvent,
    },
    /// No log in the receipt decoded as a settlement event. Reported as
    /// "no prize" because the stake is already spent; this cannot be told
    /// apart from a malformed response.
    Fallback { outcome: PlayOutcome },
}

impl Resolution {
    pub fn outcome(&self) -> PlayOutcome {
        match self {
            Resolution::Settled { outcome, .. } | Resolution::Fallback { outcome } => *outcome,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

/// Scans `logs` in order and settles on the first settlement event.
pub fn resolve_outcome(contract: &LotteryContract, logs: &[Log], no_prize_tier: u32) -> Resolution {
    match logs.iter().find_map(|log| contract.decode_settlement(log)) {
        Some(event) => Resolution::Settled {
            outcome: PlayOutcome::settle(event.prize_tier, event.amount, no_prize_tier),
            event,
        },
        None => Resolution::Fallback {
            outcome: PlayOutcome::no_prize(no_prize_tier),
        },
    }
}

/// Text handed to the platform share sheet or clipboard after a win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
}

impl SharePayload {
    pub fn for_outcome(outcome: &PlayOutcome, no_prize_tier: u32, symbol: &str) -> Option<Self> {
        if outcome.is_no_prize(no_prize_tier) || outcome.amount_wei.is_zero() {
            return None;
        }

        Some(Self {
            title: "Scratch Lottery".to_string(),
            text: format!(
                "I just won {} {} on the scratch lottery! Try your luck.",
                outcome.amount_ether(),
                symbol
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};
    use proptest::prelude::*;

    const NO_PRIZE: u32 = 6;

    fn contract() -> LotteryContract {
        LotteryContract::new(Address::repeat_byte(0xAA))
    }

    #[test]
    fn test_settled_outcome() {
        let contract = contract();
        let amount = scratchcard_core::parse_ether("0.05").unwrap();
        let logs = vec![contract.settlement_log(Address::repeat_byte(1), 2, amount)];

        let resolution = resolve_outcome(&contract, &logs, NO_PRIZE);
        assert!(!resolution.is_fallback());
        assert_eq!(
            resolution.outcome(),
            PlayOutcome {
                tier: 2,
                amount_wei: amount
            }
        );
        assert_eq!(resolution.outcome().amount_ether(), "0.05");
    }

    #[test]
    fn test_no_matching_log_falls_back_to_no_prize() {
        let contract = contract();
        let unrelated = Log {
            address: Address::repeat_byte(0xBB),
            topics: vec![],
            data: Bytes::new(),
        };

        let resolution = resolve_outcome(&contract, &[unrelated], NO_PRIZE);
        assert!(resolution.is_fallback());
        assert_eq!(
            resolution.outcome(),
            PlayOutcome {
                tier: NO_PRIZE,
                amount_wei: U256::ZERO
            }
        );
        assert_eq!(resolve_outcome(&contract, &[], NO_PRIZE).outcome(), PlayOutcome::no_prize(NO_PRIZE));
    }

    #[test]
    fn test_unrelated_log_before_settlement_is_skipped() {
        let contract = contract();
        let unrelated = Log {
            address: contract.address(),
            topics: vec![alloy_primitives::B256::repeat_byte(0x11)],
            data: Bytes::from(vec![0u8; 3]),
        };
        let settlement = contract.settlement_log(Address::ZERO, 1, U256::from(9u64));

        let outcome = resolve_outcome(&contract, &[unrelated, settlement], NO_PRIZE).outcome();
        assert_eq!(outcome.tier, 1);
        assert_eq!(outcome.amount_wei, U256::from(9u64));
    }

    #[test]
    fn test_share_payload_only_for_wins() {
        let win = PlayOutcome::settle(1, scratchcard_core::parse_ether("0.5").unwrap(), NO_PRIZE);
        let payload = SharePayload::for_outcome(&win, NO_PRIZE, "ETH").unwrap();
        assert!(payload.text.contains("0.5 ETH"));

        assert!(SharePayload::for_outcome(&PlayOutcome::no_prize(NO_PRIZE), NO_PRIZE, "ETH").is_none());
    }

    proptest! {
        #[test]
        fn prop_no_prize_tier_never_carries_amount(raw in any::<u64>(), tier in 0u32..=NO_PRIZE) {
            let contract = contract();
            let logs = vec![contract.settlement_log(Address::ZERO, tier, U256::from(raw))];
            let outcome = resolve_outcome(&contract, &logs, NO_PRIZE).outcome();

            prop_assert_eq!(outcome.tier, tier);
            if tier == NO_PRIZE {
                prop_assert_eq!(outcome.amount_wei, U256::ZERO);
            } else {
                prop_assert_eq!(outcome.amount_wei, U256::from(raw));
            }
        }
    }
}
