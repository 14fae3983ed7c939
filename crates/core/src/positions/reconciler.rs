//! Average-cost position rebuild over a normalized trade sequence.
//!
//! Trades are folded in the order given; callers are responsible for
//! supplying chronological order. This is average-cost accounting, not lot
//! tracking: realized gain per lot is never computed, only the running
//! average survives.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::positions_model::PositionCalc;
use crate::trades::{NormalizedTrade, TradeSide};

/// Replays trades per (account, conid) into signed quantity and average
/// cost basis in base currency.
pub fn rebuild_positions(base_currency: &str, trades: &[NormalizedTrade]) -> Vec<PositionCalc> {
    let mut book: HashMap<(String, i64), PositionCalc> = HashMap::new();

    for trade in trades {
        let key = (trade.account_id.clone(), trade.conid);
        let position = book.entry(key).or_insert_with(|| PositionCalc {
            account_id: trade.account_id.clone(),
            conid: trade.conid,
            symbol: trade.symbol.clone(),
            currency: trade.currency.clone(),
            quantity: Decimal::ZERO,
            avg_cost_base: Decimal::ZERO,
            date_added: None,
        });
        apply_trade(position, trade, base_currency);
    }

    let mut positions: Vec<PositionCalc> = book.into_values().collect();
    positions.sort_by(|a, b| {
        a.account_id
            .cmp(&b.account_id)
            .then(a.conid.cmp(&b.conid))
    });
    positions
}

fn apply_trade(position: &mut PositionCalc, trade: &NormalizedTrade, base_currency: &str) {
    let fx = if trade.fx_rate_to_base.is_zero() {
        Decimal::ONE
    } else {
        trade.fx_rate_to_base
    };
    let price_base = trade.trade_price * fx;
    let fees_base = trade.fees * fx;

    match trade.side {
        TradeSide::Buy if position.quantity >= Decimal::ZERO => {
            // Opening or adding to a long: fees fold into the weighted average.
            let new_qty = position.quantity + trade.quantity;
            let total_cost = position.avg_cost_base * position.quantity.abs()
                + trade.quantity * price_base
                + fees_base;
            position.quantity = new_qty;
            position.avg_cost_base = if new_qty.is_zero() {
                Decimal::ZERO
            } else {
                total_cost / new_qty.abs()
            };
            if position.date_added.is_none() {
                position.date_added = Some(trade.exec_ts);
            }
        }
        TradeSide::Buy => {
            // Covering a short; the remaining short keeps its average.
            let cover_qty = trade.quantity.min(position.quantity.abs());
            let remaining_buy = trade.quantity - cover_qty;
            if remaining_buy > Decimal::ZERO {
                // Crossed to long: basis reset from the excess buy only.
                position.quantity = remaining_buy;
                position.avg_cost_base = (remaining_buy * price_base + fees_base) / remaining_buy;
                position.currency = base_currency.to_string();
                position.date_added = Some(trade.exec_ts);
            } else {
                position.quantity += cover_qty;
                if position.quantity.is_zero() {
                    position.avg_cost_base = Decimal::ZERO;
                    position.date_added = None;
                }
            }
        }
        TradeSide::Sell if position.quantity <= Decimal::ZERO => {
            // Opening or adding to a short: basis tracks net proceeds per unit.
            let new_qty = position.quantity - trade.quantity;
            let total_proceeds = position.avg_cost_base * position.quantity.abs()
                + trade.quantity * price_base
                - fees_base;
            position.quantity = new_qty;
            position.avg_cost_base = if new_qty.is_zero() {
                Decimal::ZERO
            } else {
                total_proceeds / new_qty.abs()
            };
            if position.date_added.is_none() {
                position.date_added = Some(trade.exec_ts);
            }
        }
        TradeSide::Sell => {
            // Reducing or closing a long; average cost is unchanged.
            let sell_qty = trade.quantity.min(position.quantity);
            let remaining_sell = trade.quantity - sell_qty;
            position.quantity -= sell_qty;
            if position.quantity.is_zero() && remaining_sell.is_zero() {
                position.avg_cost_base = Decimal::ZERO;
                position.date_added = None;
            }
            if remaining_sell > Decimal::ZERO {
                // Crossed to short. The sell fee is realized, not folded into
                // the new basis (the mirrored buy path does fold it in).
                position.quantity = -remaining_sell;
                position.avg_cost_base = price_base;
                position.date_added = Some(trade.exec_ts);
            }
        }
    }
}
