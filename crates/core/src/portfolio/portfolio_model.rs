use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::flex::AccountInformation;
use crate::trades::TradeSide;

/// Freshness of the price carried on an enriched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    Fresh,
    Stale,
    Unavailable,
}

/// One position in the served portfolio view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPosition {
    pub account_id: String,
    pub symbol: String,
    pub conid: i64,
    pub name: Option<String>,
    /// "long" or "short".
    pub side: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub currency: String,
    pub base_currency: String,
    pub current_price: Option<Decimal>,
    pub current_price_currency: String,
    pub price_status: PriceStatus,
    pub price_as_of: Option<DateTime<Utc>>,
    /// Base-currency market value.
    pub market_value: Option<Decimal>,
    pub pl_abs: Option<Decimal>,
    pub pl_pct: Option<Decimal>,
    /// Share of the portfolio's priced market value; `None` when the total
    /// is zero or unknown.
    pub weight: Option<Decimal>,
    pub date_added: Option<DateTime<Utc>>,
    // Statement-sourced raw fields, for UI calculations.
    pub mark_price: Option<Decimal>,
    pub cost_basis_price: Option<Decimal>,
    pub cost_basis_money: Option<Decimal>,
    pub position_value: Option<Decimal>,
    pub fx_rate_to_base: Option<Decimal>,
    pub report_date: Option<String>,
    pub date_open: Option<String>,
}

/// One ledger trade in the served portfolio view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrade {
    /// The dedup key.
    pub id: String,
    pub date: DateTime<Utc>,
    pub account_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub fill_price: Decimal,
    pub fees: Decimal,
    pub currency: String,
    pub listing_exchange: Option<String>,
    pub current_price: Option<Decimal>,
    pub price_status: PriceStatus,
    pub price_as_of: Option<DateTime<Utc>>,
}

/// Cash row as served; the `BASE_SUMMARY` sentinel never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashReportRow {
    pub currency: String,
    pub ending_cash: Option<Decimal>,
    pub level_of_detail: Option<String>,
}

/// Cross-check of the server-reported base cash total against the locally
/// converted per-currency sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashReconciliation {
    pub reported_total: Option<Decimal>,
    pub converted_total: Decimal,
    /// True when the discrepancy exceeds the tolerance; derived FX medians
    /// are approximate, so this is a warning, not an error.
    pub approximate: bool,
}

/// Stage counts for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCounts {
    pub parsed_trades: usize,
    pub upserted_trades: usize,
    pub positions: usize,
}

/// The consolidated portfolio response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    pub base_currency: String,
    pub as_of_statement: Option<DateTime<Utc>>,
    pub positions: Vec<EnrichedPosition>,
    pub trades: Vec<EnrichedTrade>,
    pub counts: PipelineCounts,
    pub cash_report: Vec<CashReportRow>,
    pub cash_base_summary: Option<Decimal>,
    pub cash_reconciliation: Option<CashReconciliation>,
    pub fx_rates_derived: HashMap<String, Decimal>,
    pub account: Option<AccountInformation>,
    pub stale: bool,
    pub warning: Option<String>,
}
