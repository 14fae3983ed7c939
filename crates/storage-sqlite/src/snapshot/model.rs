//! Database models for cached open positions and cash balances.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use flexfolio_core::snapshot::{CachedPosition, CashBalance};

use crate::utils::{
    decimal_to_text, opt_decimal_to_text, opt_text_to_decimal, opt_text_to_timestamp,
    text_to_decimal, text_to_timestamp, timestamp_to_text,
};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::open_positions)]
#[diesel(primary_key(holder_id, conid))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpenPositionDB {
    pub holder_id: String,
    pub conid: i64,
    pub account_id: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub currency: String,
    pub quantity: String,
    pub mark_price: Option<String>,
    pub cost_basis_price: Option<String>,
    pub cost_basis_money: Option<String>,
    pub position_value: Option<String>,
    pub fx_rate_to_base: Option<String>,
    pub report_date: Option<String>,
    pub date_open: Option<String>,
    pub price_as_of: Option<String>,
    pub updated_at: String,
}

impl From<&CachedPosition> for OpenPositionDB {
    fn from(row: &CachedPosition) -> Self {
        Self {
            holder_id: row.holder_id.clone(),
            conid: row.conid,
            account_id: row.account_id.clone(),
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            currency: row.currency.clone(),
            quantity: decimal_to_text(row.quantity),
            mark_price: opt_decimal_to_text(row.mark_price),
            cost_basis_price: opt_decimal_to_text(row.cost_basis_price),
            cost_basis_money: opt_decimal_to_text(row.cost_basis_money),
            position_value: opt_decimal_to_text(row.position_value),
            fx_rate_to_base: opt_decimal_to_text(row.fx_rate_to_base),
            report_date: row.report_date.clone(),
            date_open: row.date_open.clone(),
            price_as_of: row.price_as_of.map(timestamp_to_text),
            updated_at: timestamp_to_text(row.updated_at),
        }
    }
}

impl From<OpenPositionDB> for CachedPosition {
    fn from(row: OpenPositionDB) -> Self {
        Self {
            quantity: text_to_decimal(&row.quantity, "quantity"),
            mark_price: opt_text_to_decimal(row.mark_price.as_deref()),
            cost_basis_price: opt_text_to_decimal(row.cost_basis_price.as_deref()),
            cost_basis_money: opt_text_to_decimal(row.cost_basis_money.as_deref()),
            position_value: opt_text_to_decimal(row.position_value.as_deref()),
            fx_rate_to_base: opt_text_to_decimal(row.fx_rate_to_base.as_deref()),
            price_as_of: opt_text_to_timestamp(row.price_as_of.as_deref()),
            updated_at: text_to_timestamp(&row.updated_at, "updated_at"),
            holder_id: row.holder_id,
            conid: row.conid,
            account_id: row.account_id,
            symbol: row.symbol,
            name: row.name,
            currency: row.currency,
            report_date: row.report_date,
            date_open: row.date_open,
        }
    }
}

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::cash_balances)]
#[diesel(primary_key(holder_id, currency, level_of_detail))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CashBalanceDB {
    pub holder_id: String,
    pub account_id: Option<String>,
    pub currency: String,
    /// Empty string stands in for an absent level-of-detail.
    pub level_of_detail: String,
    pub ending_cash: Option<String>,
    pub ending_settled_cash: Option<String>,
    pub updated_at: String,
}

impl From<&CashBalance> for CashBalanceDB {
    fn from(row: &CashBalance) -> Self {
        Self {
            holder_id: row.holder_id.clone(),
            account_id: row.account_id.clone(),
            currency: row.currency.clone(),
            level_of_detail: row.level_of_detail.clone().unwrap_or_default(),
            ending_cash: opt_decimal_to_text(row.ending_cash),
            ending_settled_cash: opt_decimal_to_text(row.ending_settled_cash),
            updated_at: timestamp_to_text(row.updated_at),
        }
    }
}

impl From<CashBalanceDB> for CashBalance {
    fn from(row: CashBalanceDB) -> Self {
        Self {
            ending_cash: opt_text_to_decimal(row.ending_cash.as_deref()),
            ending_settled_cash: opt_text_to_decimal(row.ending_settled_cash.as_deref()),
            updated_at: text_to_timestamp(&row.updated_at, "updated_at"),
            holder_id: row.holder_id,
            account_id: row.account_id,
            currency: row.currency,
            level_of_detail: Some(row.level_of_detail).filter(|lod| !lod.is_empty()),
        }
    }
}
