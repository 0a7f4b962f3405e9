use crate::abi::{self, WORD};
use crate::error::{GameError, Result};
use alloy_primitives::{Address, Bytes, B256, U256};
use scratchcard_core::{ExecutionContext, Log, TxHash};

const PRIZES_SIGNATURE: &str = "prizes(uint256)";
const PLAYED_TODAY_SIGNATURE: &str = "playedToday(address)";
const PLAY_SIGNATURE: &str = "play()";
/// `player` is indexed; `prizeTier` and `amount` travel in the data section.
const PLAY_EVENT_SIGNATURE: &str = "Play(address,uint256,uint256)";

/// One row of the contract's `prizes` mapping, as returned on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPrize {
    pub amount: U256,
    pub left: U256,
    pub total: U256,
    pub probability: U256,
}

/// The settlement event emitted by a successful `play()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementEvent {
    pub player: Address,
    pub prize_tier: u32,
    pub amount: U256,
}

/// Typed binding for the lottery contract's read and write surface.
#[derive(Debug, Clone)]
pub struct LotteryContract {
    address: Address,
    play_topic: B256,
}

impl LotteryContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            play_topic: abi::event_topic(PLAY_EVENT_SIGNATURE),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn settlement_topic(&self) -> B256 {
        self.play_topic
    }

    pub fn prizes_calldata(&self, tier: u32) -> Bytes {
        abi::encode_call(
            abi::selector(PRIZES_SIGNATURE),
            &[abi::uint_word(U256::from(tier))],
        )
    }

    pub fn decode_prize(&self, tier: u32, data: &[u8]) -> Result<RawPrize> {
        let field = |index: usize| {
            abi::word(data, index).ok_or_else(|| {
                GameError::invalid_response(format!(
                    "prizes({}) returned {} bytes, expected {}",
                    tier,
                    data.len(),
                    4 * WORD
                ))
            })
        };

        Ok(RawPrize {
            amount: field(0)?,
            left: field(1)?,
            total: field(2)?,
            probability: field(3)?,
        })
    }

    pub async fn prize(&self, context: &ExecutionContext, tier: u32) -> Result<RawPrize> {
        let data = context.call(self.address, self.prizes_calldata(tier)).await?;
        self.decode_prize(tier, &data)
    }

    pub fn played_today_calldata(&self, account: Address) -> Bytes {
        abi::encode_call(
            abi::selector(PLAYED_TODAY_SIGNATURE),
            &[abi::address_word(account)],
        )
    }

    pub fn decode_played_today(&self, data: &[u8]) -> Result<u32> {
        abi::word_as_u32(data, 0)
            .ok_or_else(|| GameError::invalid_response("playedToday returned an invalid count"))
    }

    pub async fn played_today(&self, context: &ExecutionContext, account: Address) -> Result<u32> {
        let data = context
            .call(self.address, self.played_today_calldata(account))
            .await?;
        self.decode_played_today(&data)
    }

    pub fn play_calldata(&self) -> Bytes {
        abi::encode_call(abi::selector(PLAY_SIGNATURE), &[])
    }

    pub async fn play(&self, context: &ExecutionContext, stake: U256) -> Result<TxHash> {
        Ok(context.send(self.address, stake, self.play_calldata()).await?)
    }

    /// Returns `None` for any log that is not this contract's settlement
    /// event or does not decode cleanly; unrelated logs in the same receipt
    /// are expected.
    pub fn decode_settlement(&self, log: &Log) -> Option<SettlementEvent> {
        if log.address != self.address {
            return None;
        }
        if log.topics.first() != Some(&self.play_topic) {
            return None;
        }

        let player = log
            .topics
            .get(1)
            .map(|topic| Address::from_word(*topic))
            .unwrap_or(Address::ZERO);
        let prize_tier = abi::word_as_u32(&log.data, 0)?;
        let amount = abi::word(&log.data, 1)?;

        Some(SettlementEvent {
            player,
            prize_tier,
            amount,
        })
    }

    #[cfg(test)]
    pub(crate) fn settlement_log(&self, player: Address, prize_tier: u32, amount: U256) -> Log {
        let mut data = Vec::with_capacity(2 * WORD);
        data.extend_from_slice(&abi::uint_word(U256::from(prize_tier)));
        data.extend_from_slice(&abi::uint_word(amount));

        Log {
            address: self.address,
            topics: vec![self.play_topic, player.into_word()],
            data: Bytes::from(data),
        }
    }
}

#[cfg(test)]
pub(crate) fn encode_prize(prize: RawPrize) -> Bytes {
    let mut data = Vec::with_capacity(4 * WORD);
    for value in [prize.amount, prize.left, prize.total, prize.probability] {
        data.extend_from_slice(&abi::uint_word(value));
    }
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    fn contract() -> LotteryContract {
        LotteryContract::new(Address::repeat_byte(0xAA))
    }

    #[test]
    fn test_decode_settlement() {
        let contract = contract();
        let player = Address::repeat_byte(0x01);
        let log = contract.settlement_log(player, 2, U256::from(5u64));

        let event = contract.decode_settlement(&log).unwrap();
        assert_eq!(event.player, player);
        assert_eq!(event.prize_tier, 2);
        assert_eq!(event.amount, U256::from(5u64));
    }

    #[test]
    fn test_unrelated_logs_are_skipped() {
        let contract = contract();
        let mut foreign = contract.settlement_log(Address::ZERO, 1, U256::ZERO);
        foreign.address = Address::repeat_byte(0xBB);
        assert!(contract.decode_settlement(&foreign).is_none());

        let transfer = Log {
            address: contract.address(),
            topics: vec![keccak256("Transfer(address,address,uint256)")],
            data: Bytes::new(),
        };
        assert!(contract.decode_settlement(&transfer).is_none());

        let mut truncated = contract.settlement_log(Address::ZERO, 1, U256::ZERO);
        truncated.data = Bytes::from(vec![0u8; WORD]);
        assert!(contract.decode_settlement(&truncated).is_none());
    }

    #[test]
    fn test_decode_prize_requires_four_words() {
        let contract = contract();
        let prize = RawPrize {
            amount: U256::from(1u64),
            left: U256::from(2u64),
            total: U256::from(3u64),
            probability: U256::from(4u64),
        };
        assert_eq!(contract.decode_prize(0, &encode_prize(prize)).unwrap(), prize);
        assert!(contract.decode_prize(0, &[0u8; 64]).is_err());
    }

    #[test]
    fn test_calldata_layout() {
        let contract = contract();
        assert_eq!(contract.play_calldata().len(), 4);
        let played = contract.played_today_calldata(Address::repeat_byte(0x01));
        assert_eq!(played.len(), 36);
        assert_eq!(&played[16..36], Address::repeat_byte(0x01).as_slice());
    }
}
