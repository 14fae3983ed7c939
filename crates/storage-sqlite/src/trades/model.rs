//! Database model for ledger trades.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use flexfolio_core::trades::{NormalizedTrade, TradeSide};

use crate::utils::{decimal_to_text, text_to_decimal, text_to_timestamp, timestamp_to_text};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::trades)]
#[diesel(primary_key(trade_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeDB {
    pub trade_key: String,
    pub ib_exec_id: Option<String>,
    pub trade_id: Option<String>,
    pub account_id: String,
    pub symbol: String,
    pub conid: i64,
    pub side: String,
    pub quantity: String,
    pub trade_price: String,
    pub fees: String,
    pub currency: String,
    pub fx_rate_to_base: String,
    pub exec_ts: String,
    pub trade_date: Option<String>,
    pub listing_exchange: Option<String>,
    pub created_at: String,
}

impl From<&NormalizedTrade> for TradeDB {
    fn from(trade: &NormalizedTrade) -> Self {
        Self {
            trade_key: trade.trade_key.clone(),
            ib_exec_id: trade.ib_exec_id.clone(),
            trade_id: trade.trade_id.clone(),
            account_id: trade.account_id.clone(),
            symbol: trade.symbol.clone(),
            conid: trade.conid,
            side: trade.side.as_str().to_string(),
            quantity: decimal_to_text(trade.quantity),
            trade_price: decimal_to_text(trade.trade_price),
            fees: decimal_to_text(trade.fees),
            currency: trade.currency.clone(),
            fx_rate_to_base: decimal_to_text(trade.fx_rate_to_base),
            exec_ts: timestamp_to_text(trade.exec_ts),
            trade_date: trade.trade_date.clone(),
            listing_exchange: trade.listing_exchange.clone(),
            created_at: timestamp_to_text(Utc::now()),
        }
    }
}

impl From<TradeDB> for NormalizedTrade {
    fn from(row: TradeDB) -> Self {
        let side = TradeSide::parse(&row.side).unwrap_or_else(|| {
            log::error!("unknown trade side '{}' for {}; assuming BUY", row.side, row.trade_key);
            TradeSide::Buy
        });
        Self {
            side,
            quantity: text_to_decimal(&row.quantity, "quantity"),
            trade_price: text_to_decimal(&row.trade_price, "trade_price"),
            fees: text_to_decimal(&row.fees, "fees"),
            fx_rate_to_base: text_to_decimal(&row.fx_rate_to_base, "fx_rate_to_base"),
            exec_ts: text_to_timestamp(&row.exec_ts, "exec_ts"),
            trade_key: row.trade_key,
            ib_exec_id: row.ib_exec_id,
            trade_id: row.trade_id,
            account_id: row.account_id,
            symbol: row.symbol,
            conid: row.conid,
            currency: row.currency,
            trade_date: row.trade_date,
            listing_exchange: row.listing_exchange,
        }
    }
}
