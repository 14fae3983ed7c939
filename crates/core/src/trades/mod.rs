//! Trades module - normalization of raw statement trades into the ledger.

mod normalizer;
mod trades_model;
mod trades_traits;

#[cfg(test)]
mod normalizer_tests;

pub use normalizer::normalize_trades;
pub use trades_model::{NormalizeOutcome, NormalizedTrade, SkipCounts, TradeSide};
pub use trades_traits::TradeRepositoryTrait;
