use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::flex::{CashReportCurrency, OpenPosition};
use crate::utils::time_utils::parse_flex_timestamp;

/// Cached open-position row for one holder, unique by (holder, conid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPosition {
    pub holder_id: String,
    pub conid: i64,
    pub account_id: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub currency: String,
    /// Signed; negative for shorts.
    pub quantity: Decimal,
    pub mark_price: Option<Decimal>,
    pub cost_basis_price: Option<Decimal>,
    pub cost_basis_money: Option<Decimal>,
    pub position_value: Option<Decimal>,
    pub fx_rate_to_base: Option<Decimal>,
    pub report_date: Option<String>,
    pub date_open: Option<String>,
    pub price_as_of: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CachedPosition {
    /// Maps a parsed open-position record onto a cache row.
    ///
    /// Rows without an instrument id or symbol cannot be keyed and yield
    /// `None`.
    pub fn from_open_position(
        holder_id: &str,
        record: &OpenPosition,
        price_as_of: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let conid = record.conid.filter(|c| *c != 0)?;
        let symbol = record.symbol.clone().filter(|s| !s.is_empty())?;
        Some(Self {
            holder_id: holder_id.to_string(),
            conid,
            account_id: record.account_id.clone(),
            symbol,
            name: record.description.clone(),
            currency: record
                .currency
                .as_deref()
                .unwrap_or("USD")
                .to_uppercase(),
            quantity: record.position.unwrap_or_default(),
            mark_price: record.mark_price,
            cost_basis_price: record.cost_basis_price.or(record.open_price),
            cost_basis_money: record.cost_basis_money,
            position_value: record.position_value,
            fx_rate_to_base: record.fx_rate_to_base,
            report_date: record.report_date.clone(),
            date_open: record
                .open_date_time
                .clone()
                .or_else(|| record.holding_period_date_time.clone()),
            price_as_of,
            updated_at: now,
        })
    }

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

    pub fn date_added(&self) -> Option<DateTime<Utc>> {
        self.date_open.as_deref().and_then(parse_flex_timestamp)
    }
}

/// Cached cash row, unique by (holder, currency, level-of-detail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    pub holder_id: String,
    pub account_id: Option<String>,
    pub currency: String,
    pub level_of_detail: Option<String>,
    pub ending_cash: Option<Decimal>,
    pub ending_settled_cash: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl CashBalance {
    /// Maps a parsed cash-report row onto a cache row; rows without a
    /// currency cannot be keyed and yield `None`.
    pub fn from_cash_report(
        holder_id: &str,
        record: &CashReportCurrency,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let currency = record
            .currency
            .clone()
            .filter(|c| !c.is_empty())?
            .to_uppercase();
        Some(Self {
            holder_id: holder_id.to_string(),
            account_id: record.account_id.clone(),
            currency,
            level_of_detail: record.level_of_detail.clone(),
            ending_cash: record.ending_cash,
            ending_settled_cash: record.ending_settled_cash,
            updated_at: now,
        })
    }
}

/// The cached view served to readers, possibly stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderSnapshot {
    pub base_currency: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub stale: bool,
    pub positions: Vec<CachedPosition>,
    pub cash_balances: Vec<CashBalance>,
}

/// Result of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// Position rows upserted; zero when another refresh was in flight.
    pub updated: usize,
}
