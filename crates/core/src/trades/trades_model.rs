use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BUY" => Some(TradeSide::Buy),
            "SELL" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated, validated trade.
///
/// `trade_key` is deterministic: `ibExec:<execution id>` when the execution
/// id is present, else `trade:<trade id>`. Records with neither never reach
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTrade {
    pub trade_key: String,
    pub ib_exec_id: Option<String>,
    pub trade_id: Option<String>,
    pub account_id: String,
    pub symbol: String,
    pub conid: i64,
    pub side: TradeSide,
    /// Always positive; the side carries direction.
    pub quantity: Decimal,
    /// Per unit, in trade currency.
    pub trade_price: Decimal,
    /// Commission plus matched transaction tax, in trade currency.
    pub fees: Decimal,
    pub currency: String,
    pub fx_rate_to_base: Decimal,
    pub exec_ts: DateTime<Utc>,
    pub trade_date: Option<String>,
    pub listing_exchange: Option<String>,
}

/// Per-reason tallies for records dropped during normalization.
///
/// Field order matches the validation order; a record is counted against
/// the first check it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub missing_account_id: u32,
    pub missing_symbol: u32,
    pub missing_conid: u32,
    pub missing_side: u32,
    pub missing_quantity: u32,
    pub missing_price: u32,
    pub missing_key: u32,
}

impl SkipCounts {
    pub fn total(&self) -> u32 {
        self.missing_account_id
            + self.missing_symbol
            + self.missing_conid
            + self.missing_side
            + self.missing_quantity
            + self.missing_price
            + self.missing_key
    }
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub trades: Vec<NormalizedTrade>,
    pub skips: SkipCounts,
}
