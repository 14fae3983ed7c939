//! Typed records extracted from a Flex statement document.
//!
//! Fields the source may omit are `Option`-typed; an absent or empty
//! attribute maps to `None` rather than a zero or empty string. The one
//! domain default is the trade FX-to-base rate, which falls back to 1.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::BASE_SUMMARY_CURRENCY;
use crate::utils::time_utils::parse_flex_timestamp;

/// Statement header: account, reporting period, generation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementInfo {
    pub account_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    /// `YYYYMMDD;HHMMSS`, always UTC.
    pub when_generated: Option<String>,
}

impl StatementInfo {
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.when_generated
            .as_deref()
            .and_then(parse_flex_timestamp)
    }
}

/// Account metadata; absent on some query configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInformation {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub name: Option<String>,
    pub account_type: Option<String>,
    pub customer_type: Option<String>,
    pub master_name: Option<String>,
}

/// One cash row per currency per account per statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashReportCurrency {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub level_of_detail: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub ending_cash: Option<Decimal>,
    pub ending_settled_cash: Option<Decimal>,
}

impl CashReportCurrency {
    /// The pre-aggregated base-currency total, not a real holding.
    pub fn is_base_summary(&self) -> bool {
        self.currency.as_deref() == Some(BASE_SUMMARY_CURRENCY)
    }
}

/// Execution-level trade record as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexTrade {
    pub trade_id: Option<String>,
    pub ib_exec_id: Option<String>,
    pub account_id: Option<String>,
    pub trade_date: Option<String>,
    pub date_time: Option<String>,
    pub settle_date_target: Option<String>,
    pub buy_sell: Option<String>,
    pub quantity: Option<Decimal>,
    pub trade_price: Option<Decimal>,
    pub ib_commission: Option<Decimal>,
    pub net_cash: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub fifo_pnl_realized: Option<Decimal>,
    pub mtm_pnl: Option<Decimal>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub conid: Option<i64>,
    pub asset_category: Option<String>,
    pub sub_category: Option<String>,
    pub listing_exchange: Option<String>,
    pub currency: Option<String>,
    /// Defaults to 1 when the statement omits it.
    pub fx_rate_to_base: Decimal,
}

impl Default for FlexTrade {
    fn default() -> Self {
        Self {
            trade_id: None,
            ib_exec_id: None,
            account_id: None,
            trade_date: None,
            date_time: None,
            settle_date_target: None,
            buy_sell: None,
            quantity: None,
            trade_price: None,
            ib_commission: None,
            net_cash: None,
            cost: None,
            fifo_pnl_realized: None,
            mtm_pnl: None,
            symbol: None,
            description: None,
            conid: None,
            asset_category: None,
            sub_category: None,
            listing_exchange: None,
            currency: None,
            fx_rate_to_base: Decimal::ONE,
        }
    }
}

/// Transaction tax keyed by trade or order id; merged into trade fees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTax {
    pub trade_id: Option<String>,
    pub order_id: Option<String>,
    pub tax_description: Option<String>,
    pub tax_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub conid: Option<i64>,
    pub symbol: Option<String>,
    pub date: Option<String>,
}

/// Per-instrument open-position snapshot row.
///
/// Not filtered by asset category at parse time; the snapshot cache applies
/// its allowlist downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub fx_rate_to_base: Option<Decimal>,
    pub asset_category: Option<String>,
    pub sub_category: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub conid: Option<i64>,
    pub listing_exchange: Option<String>,
    pub report_date: Option<String>,
    /// Signed; negative for shorts.
    pub position: Option<Decimal>,
    pub mark_price: Option<Decimal>,
    pub position_value: Option<Decimal>,
    pub open_price: Option<Decimal>,
    pub cost_basis_price: Option<Decimal>,
    pub cost_basis_money: Option<Decimal>,
    pub side: Option<String>,
    pub level_of_detail: Option<String>,
    pub open_date_time: Option<String>,
    pub holding_period_date_time: Option<String>,
}

/// Counts at each trade filter stage, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub total_trade_tags: usize,
    pub execution_trades: usize,
    pub equities_trades: usize,
    pub taxes: usize,
}

/// Fully parsed statement document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexStatement {
    pub info: StatementInfo,
    pub account: Option<AccountInformation>,
    pub cash_report: Vec<CashReportCurrency>,
    pub trades: Vec<FlexTrade>,
    pub taxes: Vec<TransactionTax>,
    pub open_positions: Vec<OpenPosition>,
    pub stats: ParseStats,
}
