use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running average-cost position for one (account, instrument) key.
///
/// Created on the first trade touching the key, mutated by every
/// subsequent trade in processing order. Returning to exactly zero clears
/// the cost basis and open date; the next trade away from zero reopens the
/// position with a fresh open date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionCalc {
    pub account_id: String,
    pub conid: i64,
    pub symbol: String,
    pub currency: String,
    /// Signed; negative means short.
    pub quantity: Decimal,
    /// Average cost per unit, expressed in base currency.
    pub avg_cost_base: Decimal,
    /// When the current position was opened; `None` while flat.
    pub date_added: Option<DateTime<Utc>>,
}

impl PositionCalc {
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    pub fn side_label(&self) -> &'static str {
        if self.is_short() {
            "short"
        } else {
            "long"
        }
    }
}
