//! Trade normalization: validation, dedup keys, and fee merging.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use super::trades_model::{NormalizeOutcome, NormalizedTrade, SkipCounts, TradeSide};
use crate::flex::{FlexTrade, TransactionTax};
use crate::utils::time_utils::{parse_flex_date, parse_flex_timestamp};

/// Sums absolute tax amounts by trade/order identifier.
fn tax_totals(taxes: &[TransactionTax]) -> HashMap<String, Decimal> {
    let mut totals = HashMap::new();
    for tax in taxes {
        let key = tax
            .trade_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(tax.order_id.as_deref().filter(|id| !id.is_empty()));
        let Some(key) = key else { continue };
        *totals.entry(key.to_string()).or_insert(Decimal::ZERO) +=
            tax.tax_amount.unwrap_or_default().abs();
    }
    totals
}

/// Validates and normalizes raw trades, merging taxes into fees.
///
/// Deterministic and side-effect-free. Per-record problems are tallied,
/// never raised; `skips.total() + trades.len()` always equals the raw input
/// length.
pub fn normalize_trades(trades: &[FlexTrade], taxes: &[TransactionTax]) -> NormalizeOutcome {
    let tax_by_trade_id = tax_totals(taxes);

    let mut out = Vec::with_capacity(trades.len());
    let mut skips = SkipCounts::default();

    for trade in trades {
        let Some(account_id) = trade.account_id.as_deref().filter(|v| !v.is_empty()) else {
            skips.missing_account_id += 1;
            continue;
        };
        let Some(symbol) = trade.symbol.as_deref().filter(|v| !v.is_empty()) else {
            skips.missing_symbol += 1;
            continue;
        };
        let Some(conid) = trade.conid.filter(|c| *c != 0) else {
            skips.missing_conid += 1;
            continue;
        };
        let Some(side) = trade.buy_sell.as_deref().and_then(TradeSide::parse) else {
            skips.missing_side += 1;
            continue;
        };
        let Some(quantity) = trade.quantity.filter(|q| !q.is_zero()) else {
            skips.missing_quantity += 1;
            continue;
        };
        let Some(price) = trade.trade_price.filter(|p| !p.is_zero()) else {
            skips.missing_price += 1;
            continue;
        };

        let trade_id = trade.trade_id.as_deref().filter(|v| !v.is_empty());
        let ib_exec_id = trade.ib_exec_id.as_deref().filter(|v| !v.is_empty());
        let trade_key = ib_exec_id
            .map(|id| format!("ibExec:{id}"))
            .or_else(|| trade_id.map(|id| format!("trade:{id}")));
        let Some(trade_key) = trade_key else {
            skips.missing_key += 1;
            continue;
        };

        let commission = trade.ib_commission.unwrap_or_default().abs();
        // Taxes are looked up by trade id only; order-id entries exist for
        // records whose tax rows reference the order instead.
        let tax = trade_id
            .and_then(|id| tax_by_trade_id.get(id))
            .copied()
            .unwrap_or_default();

        let exec_ts = trade
            .date_time
            .as_deref()
            .and_then(parse_flex_timestamp)
            .or_else(|| trade.trade_date.as_deref().and_then(parse_flex_date))
            .unwrap_or_else(Utc::now);

        let fx_rate_to_base = if trade.fx_rate_to_base.is_zero() {
            Decimal::ONE
        } else {
            trade.fx_rate_to_base
        };

        out.push(NormalizedTrade {
            trade_key,
            ib_exec_id: ib_exec_id.map(str::to_string),
            trade_id: trade_id.map(str::to_string),
            account_id: account_id.to_string(),
            symbol: symbol.to_string(),
            conid,
            side,
            quantity: quantity.abs(),
            trade_price: price,
            fees: commission + tax.abs(),
            currency: trade
                .currency
                .as_deref()
                .unwrap_or("USD")
                .to_uppercase(),
            fx_rate_to_base,
            exec_ts,
            trade_date: trade.trade_date.clone(),
            listing_exchange: trade.listing_exchange.clone(),
        });
    }

    NormalizeOutcome { trades: out, skips }
}
