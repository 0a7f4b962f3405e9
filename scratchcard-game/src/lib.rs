//! Scratch card game - paid draws, prize inventory and the scratch-off reveal
//!
//! Builds on `scratchcard-core` for wallet connectivity. A [`GameClient`]
//! connects through the [`ChainGate`](scratchcard_core::ChainGate), reads the
//! prize table into a [`PrizeLedgerView`], plays through a [`PlaySession`]
//! and hands the resulting [`PlayOutcome`] to a [`ScratchEngine`].

pub mod abi;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod outcome;
pub mod scratch;
pub mod session;

#[cfg(test)]
mod testing;

pub use client::GameClient;
pub use config::{GameConfig, ScratchConfig};
pub use contract::{LotteryContract, RawPrize, SettlementEvent};
pub use error::{GameError, Result};
pub use ledger::{PrizeLedgerView, PrizeTier};
pub use outcome::{resolve_outcome, PlayOutcome, Resolution, SharePayload};
pub use scratch::{
    CoverageMask, Point, RasterMask, ScratchEngine, ScratchEvent, ScratchPhase, ScratchState,
};
pub use session::{PlaySession, TransactionState};
