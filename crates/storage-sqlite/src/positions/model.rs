//! Database model for reconciled positions.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use flexfolio_core::positions::PositionCalc;

use crate::utils::{
    decimal_to_text, opt_text_to_timestamp, text_to_decimal, timestamp_to_text,
};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(primary_key(account_id, conid))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub account_id: String,
    pub conid: i64,
    pub symbol: String,
    pub currency: String,
    pub quantity: String,
    pub avg_cost_base: String,
    pub date_added: Option<String>,
    pub updated_at: String,
}

impl From<&PositionCalc> for PositionDB {
    fn from(calc: &PositionCalc) -> Self {
        Self {
            account_id: calc.account_id.clone(),
            conid: calc.conid,
            symbol: calc.symbol.clone(),
            currency: calc.currency.clone(),
            quantity: decimal_to_text(calc.quantity),
            avg_cost_base: decimal_to_text(calc.avg_cost_base),
            date_added: calc.date_added.map(timestamp_to_text),
            updated_at: timestamp_to_text(Utc::now()),
        }
    }
}

impl From<PositionDB> for PositionCalc {
    fn from(row: PositionDB) -> Self {
        Self {
            quantity: text_to_decimal(&row.quantity, "quantity"),
            avg_cost_base: text_to_decimal(&row.avg_cost_base, "avg_cost_base"),
            date_added: opt_text_to_timestamp(row.date_added.as_deref()),
            account_id: row.account_id,
            conid: row.conid,
            symbol: row.symbol,
            currency: row.currency,
        }
    }
}
