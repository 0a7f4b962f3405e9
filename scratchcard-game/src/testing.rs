//! Simulated lottery contract wired into the core `MockWallet`.

use crate::abi;
use crate::config::GameConfig;
use crate::contract::{encode_prize, LotteryContract, RawPrize};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use parking_lot::Mutex;
use scratchcard_core::test_helpers::{account, MockWallet};
use scratchcard_core::{
    parse_ether, ChainConfig, ChainError, ChainGate, ChainId, Log, TransactionReceipt,
    WalletProvider,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

pub(crate) const PLAYER: u8 = 0x01;

struct LotteryState {
    prizes: Vec<RawPrize>,
    played: HashMap<Address, u32>,
    failing_tiers: HashSet<u32>,
    fail_played_today: bool,
    next_tier: u32,
    emit_settlement: bool,
    extra_logs: Vec<Log>,
    revert_next: bool,
    sends: u8,
}

pub(crate) struct SimulatedLottery {
    contract: LotteryContract,
    config: GameConfig,
    state: Arc<Mutex<LotteryState>>,
}

impl SimulatedLottery {
    pub(crate) fn new() -> Self {
        let config = GameConfig {
            receipt_poll_interval_ms: 1,
            confirmation_timeout_secs: 2,
            ..GameConfig::default()
        };
        let amounts = ["1", "0.5", "0.05", "0.03", "0.02", "0.01", "0"];
        let stock = [1u64, 5, 20, 50, 100, 200, 1000];
        let odds = [10u64, 50, 200, 500, 1000, 2000, 6240];

        let prizes = (0..7)
            .map(|i| RawPrize {
                amount: parse_ether(amounts[i]).unwrap(),
                left: U256::from(stock[i]),
                total: U256::from(stock[i]),
                probability: U256::from(odds[i]),
            })
            .collect();

        Self {
            contract: LotteryContract::new(config.contract_address),
            config,
            state: Arc::new(Mutex::new(LotteryState {
                prizes,
                played: HashMap::new(),
                failing_tiers: HashSet::new(),
                fail_played_today: false,
                next_tier: 6,
                emit_settlement: true,
                extra_logs: Vec::new(),
                revert_next: false,
                sends: 0,
            })),
        }
    }

    pub(crate) fn contract(&self) -> LotteryContract {
        self.contract.clone()
    }

    pub(crate) fn config(&self) -> GameConfig {
        self.config.clone()
    }

    pub(crate) fn fail_tier(&self, tier: u32) {
        self.state.lock().failing_tiers.insert(tier);
    }

    pub(crate) fn set_played(&self, player: Address, count: u32) {
        self.state.lock().played.insert(player, count);
    }

    pub(crate) fn fail_played_today(&self, fail: bool) {
        self.state.lock().fail_played_today = fail;
    }

    /// Tier awarded by the next `play()`.
    pub(crate) fn draw_next(&self, tier: u32) {
        self.state.lock().next_tier = tier;
    }

    pub(crate) fn suppress_settlement(&self) {
        self.state.lock().emit_settlement = false;
    }

    pub(crate) fn add_unrelated_log(&self, log: Log) {
        self.state.lock().extra_logs.push(log);
    }

    pub(crate) fn revert_next(&self) {
        self.state.lock().revert_next = true;
    }

    pub(crate) fn remaining(&self, tier: u32) -> U256 {
        self.state.lock().prizes[tier as usize].left
    }

    pub(crate) fn install(&self, wallet: &Arc<MockWallet>) {
        let state = Arc::clone(&self.state);
        let prizes_selector = abi::selector("prizes(uint256)");
        let played_selector = abi::selector("playedToday(address)");

        wallet.on_call(move |_to, data| {
            let state = state.lock();
            let args = &data[4..];
            if data[..4] == prizes_selector {
                let tier = abi::word_as_u32(args, 0).unwrap_or(u32::MAX);
                if state.failing_tiers.contains(&tier) {
                    return Err(ChainError::rpc(-32000, "execution reverted"));
                }
                return state
                    .prizes
                    .get(tier as usize)
                    .map(|prize| encode_prize(*prize))
                    .ok_or_else(|| ChainError::rpc(-32000, "execution reverted"));
            }
            if data[..4] == played_selector {
                if state.fail_played_today {
                    return Err(ChainError::rpc(-32603, "header not found"));
                }
                let player = Address::from_slice(&args[12..32]);
                let count = state.played.get(&player).copied().unwrap_or(0);
                return Ok(Bytes::from(abi::uint_word(U256::from(count)).to_vec()));
            }
            Err(ChainError::rpc(-32000, "unknown selector"))
        });

        let state = Arc::clone(&self.state);
        let contract = self.contract.clone();
        let stake = self.config.stake_wei;
        let weak: Weak<MockWallet> = Arc::downgrade(wallet);

        wallet.on_send(move |request| {
            if request.to != contract.address() || request.data != contract.play_calldata() {
                return Err(ChainError::rpc(-32000, "unexpected call"));
            }
            if request.value != stake {
                return Err(ChainError::rpc(-32000, "execution reverted: wrong stake"));
            }

            let mut state = state.lock();
            state.sends += 1;
            let hash = B256::repeat_byte(0xF0 | (state.sends & 0x0F));
            let reverted = std::mem::take(&mut state.revert_next);

            let mut logs = state.extra_logs.clone();
            if !reverted {
                let tier = state.next_tier;
                *state.played.entry(request.from).or_insert(0) += 1;
                let prize = &mut state.prizes[tier as usize];
                prize.left -= U256::from(1u64);
                let amount = prize.amount;
                if state.emit_settlement {
                    logs.push(contract.settlement_log(request.from, tier, amount));
                }
            }

            if let Some(wallet) = weak.upgrade() {
                wallet.insert_receipt(TransactionReceipt {
                    transaction_hash: hash,
                    status: Some(U64::from(if reverted { 0u64 } else { 1u64 })),
                    block_number: Some(U64::from(1u64)),
                    logs,
                });
            }
            Ok(hash)
        });
    }
}

pub(crate) fn new_wallet(lottery: &SimulatedLottery) -> Arc<MockWallet> {
    let wallet = Arc::new(MockWallet::new(ChainId::SEPOLIA, vec![account(PLAYER)]));
    lottery.install(&wallet);
    wallet
}

pub(crate) async fn connected_context(lottery: &SimulatedLottery) -> (Arc<MockWallet>, Arc<ChainGate>) {
    let wallet = new_wallet(lottery);
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    let gate = Arc::new(ChainGate::new(Some(provider), ChainConfig::sepolia()).unwrap());
    gate.connect().await.unwrap();
    (wallet, gate)
}

/// Collects formatted log lines written while a [`LogCapture`] is installed
/// on the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let buffer = Arc::clone(&self.buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || LogWriter(Arc::clone(&buffer)))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
