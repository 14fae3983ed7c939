//! Derivation of the served portfolio view: market values, P&L, weights,
//! representative FX rates, and the base-cash cross-check.
//!
//! Prices come only from the fetched statement (open-position marks); there
//! is no external quote source.

use std::collections::HashMap;
use std::str::FromStr;

use log::debug;
use rust_decimal::Decimal;

use super::portfolio_model::{
    CashReconciliation, CashReportRow, EnrichedPosition, EnrichedTrade, PipelineCounts,
    PortfolioView, PriceStatus,
};
use crate::constants::CASH_CHECK_TOLERANCE;
use crate::flex::{AccountInformation, FlexStatement, OpenPosition};
use crate::positions::PositionCalc;
use crate::snapshot::HolderSnapshot;
use crate::trades::NormalizedTrade;

/// Inputs for the statement-driven (pipeline) view.
pub struct StatementViewInput<'a> {
    pub statement: &'a FlexStatement,
    pub positions: &'a [PositionCalc],
    pub trades: &'a [NormalizedTrade],
    pub upserted_trades: usize,
    /// Used when the statement carries no account information.
    pub default_base_currency: &'a str,
}

fn median(mut samples: Vec<Decimal>) -> Option<Decimal> {
    if samples.is_empty() {
        return None;
    }
    samples.sort();
    let mid = samples.len() / 2;
    Some(if samples.len() % 2 == 0 {
        (samples[mid - 1] + samples[mid]) / Decimal::TWO
    } else {
        samples[mid]
    })
}

/// Representative FX rate per currency: the median of the observed
/// per-position FX-to-base samples. The base currency is pinned to 1.
pub fn derive_fx_rates(
    base_currency: &str,
    samples: impl IntoIterator<Item = (String, Decimal)>,
) -> HashMap<String, Decimal> {
    let mut by_currency: HashMap<String, Vec<Decimal>> = HashMap::new();
    for (currency, rate) in samples {
        let currency = currency.trim().to_uppercase();
        if currency.is_empty() {
            continue;
        }
        by_currency.entry(currency).or_default().push(rate);
    }

    let mut rates: HashMap<String, Decimal> = by_currency
        .into_iter()
        .filter_map(|(currency, samples)| median(samples).map(|rate| (currency, rate)))
        .collect();
    rates.insert(base_currency.to_uppercase(), Decimal::ONE);
    rates
}

fn cash_tolerance() -> Decimal {
    Decimal::from_str(CASH_CHECK_TOLERANCE).unwrap_or(Decimal::new(1, 2))
}

/// Cross-checks the reported base cash total against the locally converted
/// per-currency sum. A discrepancy beyond the tolerance only flags the
/// result as approximate.
pub fn reconcile_cash(
    cash_report: &[CashReportRow],
    reported_total: Option<Decimal>,
    fx_rates: &HashMap<String, Decimal>,
) -> CashReconciliation {
    let converted_total: Decimal = cash_report
        .iter()
        .filter_map(|row| {
            let cash = row.ending_cash?;
            let rate = fx_rates
                .get(&row.currency)
                .copied()
                .unwrap_or(Decimal::ONE);
            Some(cash * rate)
        })
        .sum();

    let approximate = reported_total
        .map(|reported| (reported - converted_total).abs() > cash_tolerance())
        .unwrap_or(false);
    if approximate {
        debug!(
            "base cash cross-check off by more than {}: reported {:?}, converted {}",
            CASH_CHECK_TOLERANCE, reported_total, converted_total
        );
    }

    CashReconciliation {
        reported_total,
        converted_total,
        approximate,
    }
}

fn split_cash_rows(
    rows: impl IntoIterator<Item = (Option<String>, Option<Decimal>, Option<String>)>,
) -> (Vec<CashReportRow>, Option<Decimal>) {
    let mut report = Vec::new();
    let mut base_summary = None;
    for (currency, ending_cash, level_of_detail) in rows {
        let Some(currency) = currency.map(|c| c.to_uppercase()).filter(|c| !c.is_empty()) else {
            continue;
        };
        if currency == crate::constants::BASE_SUMMARY_CURRENCY {
            base_summary = base_summary.or(ending_cash);
            continue;
        }
        report.push(CashReportRow {
            currency,
            ending_cash,
            level_of_detail,
        });
    }
    (report, base_summary)
}

/// Applies weights over the priced total; `None` weight when the total is
/// not positive.
fn apply_weights(positions: &mut [EnrichedPosition]) {
    let total: Decimal = positions
        .iter()
        .filter(|p| p.price_status == PriceStatus::Fresh)
        .filter_map(|p| p.market_value)
        .sum();
    for position in positions.iter_mut() {
        position.weight = match position.market_value {
            Some(value) if total > Decimal::ZERO => Some(value / total),
            _ => None,
        };
    }
}

/// Builds the view for a freshly fetched statement and its reconciled
/// positions.
pub fn assemble_statement_view(input: StatementViewInput<'_>) -> PortfolioView {
    let statement = input.statement;

    // Reporting currency preferred over the configured default.
    let base_currency = statement
        .account
        .as_ref()
        .and_then(|a| a.currency.as_deref())
        .unwrap_or(input.default_base_currency)
        .to_uppercase();

    let as_of = statement.info.generated_at();

    // Price and name enrichment from the statement's open positions.
    let mut price_base_by_conid: HashMap<i64, Decimal> = HashMap::new();
    let mut record_by_conid: HashMap<i64, &OpenPosition> = HashMap::new();
    for record in &statement.open_positions {
        let Some(conid) = record.conid else { continue };
        if let Some(mark) = record.mark_price {
            let fx = record.fx_rate_to_base.unwrap_or(Decimal::ONE);
            price_base_by_conid.insert(conid, mark * fx);
        }
        record_by_conid.entry(conid).or_insert(record);
    }

    let mut positions: Vec<EnrichedPosition> = input
        .positions
        .iter()
        .map(|calc| {
            let record = record_by_conid.get(&calc.conid).copied();
            let price = price_base_by_conid.get(&calc.conid).copied();
            let market_value = price.map(|p| p * calc.quantity);
            let pl_abs = price.map(|p| (p - calc.avg_cost_base) * calc.quantity);
            let pl_pct = price.and_then(|p| {
                if calc.avg_cost_base.is_zero() {
                    None
                } else {
                    Some(p / calc.avg_cost_base - Decimal::ONE)
                }
            });
            EnrichedPosition {
                account_id: calc.account_id.clone(),
                symbol: calc.symbol.clone(),
                conid: calc.conid,
                name: record.and_then(|r| r.description.clone()),
                side: calc.side_label().to_string(),
                quantity: calc.quantity,
                avg_cost: calc.avg_cost_base,
                currency: calc.currency.clone(),
                base_currency: base_currency.clone(),
                current_price: price,
                current_price_currency: base_currency.clone(),
                price_status: if price.is_some() {
                    PriceStatus::Fresh
                } else {
                    PriceStatus::Unavailable
                },
                price_as_of: as_of,
                market_value,
                pl_abs,
                pl_pct,
                weight: None,
                date_added: calc.date_added,
                mark_price: record.and_then(|r| r.mark_price),
                cost_basis_price: record.and_then(|r| r.cost_basis_price),
                cost_basis_money: record.and_then(|r| r.cost_basis_money),
                position_value: record
                    .and_then(|r| r.position_value)
                    .or_else(|| record.and_then(|r| r.mark_price).map(|m| m * calc.quantity)),
                fx_rate_to_base: record.and_then(|r| r.fx_rate_to_base),
                report_date: record.and_then(|r| r.report_date.clone()),
                date_open: record.and_then(|r| {
                    r.open_date_time
                        .clone()
                        .or_else(|| r.holding_period_date_time.clone())
                }),
            }
        })
        .collect();
    apply_weights(&mut positions);

    let trades: Vec<EnrichedTrade> = input
        .trades
        .iter()
        .map(|trade| {
            let price = price_base_by_conid.get(&trade.conid).copied();
            EnrichedTrade {
                id: trade.trade_key.clone(),
                date: trade.exec_ts,
                account_id: trade.account_id.clone(),
                symbol: trade.symbol.clone(),
                side: trade.side,
                quantity: trade.quantity,
                fill_price: trade.trade_price,
                fees: trade.fees,
                currency: trade.currency.clone(),
                listing_exchange: trade.listing_exchange.clone(),
                current_price: price,
                price_status: if price.is_some() {
                    PriceStatus::Fresh
                } else {
                    PriceStatus::Unavailable
                },
                price_as_of: as_of,
            }
        })
        .collect();

    let fx_rates_derived = derive_fx_rates(
        &base_currency,
        statement.open_positions.iter().filter_map(|record| {
            let currency = record.currency.clone()?;
            let rate = record.fx_rate_to_base?;
            Some((currency, rate))
        }),
    );

    let (cash_report, cash_base_summary) = split_cash_rows(statement.cash_report.iter().map(|r| {
        (
            r.currency.clone(),
            r.ending_cash,
            r.level_of_detail.clone(),
        )
    }));
    let cash_reconciliation = Some(reconcile_cash(
        &cash_report,
        cash_base_summary,
        &fx_rates_derived,
    ));

    let warning = if input.trades.is_empty() {
        Some(
            "No equities executions found. Ensure the query includes Trades with \
             levelOfDetail=EXECUTION and assetCategory STK/ETF."
                .to_string(),
        )
    } else {
        None
    };

    let counts = PipelineCounts {
        parsed_trades: input.trades.len(),
        upserted_trades: input.upserted_trades,
        positions: positions.len(),
    };

    PortfolioView {
        base_currency,
        as_of_statement: as_of,
        positions,
        trades,
        counts,
        cash_report,
        cash_base_summary,
        cash_reconciliation,
        fx_rates_derived,
        account: statement.account.clone(),
        stale: false,
        warning,
    }
}

/// Builds the view from a cached holder snapshot, preserving its staleness
/// flag.
pub fn assemble_snapshot_view(snapshot: &HolderSnapshot) -> PortfolioView {
    let base_currency = snapshot.base_currency.to_uppercase();

    let fx_rates_derived = derive_fx_rates(
        &base_currency,
        snapshot.positions.iter().filter_map(|row| {
            let rate = row.fx_rate_to_base?;
            Some((row.currency.clone(), rate))
        }),
    );

    let mut positions: Vec<EnrichedPosition> = snapshot
        .positions
        .iter()
        .map(|row| {
            let fx = row.fx_rate_to_base.unwrap_or(Decimal::ONE);
            let native_value = row
                .position_value
                .or_else(|| row.mark_price.map(|mark| mark * row.quantity));
            let market_value = native_value.map(|value| value * fx);
            // P&L in the row's native currency, from statement cost fields.
            let pl_abs = match (row.cost_basis_money, row.position_value) {
                (Some(cost), Some(value)) => Some(value - cost),
                _ => match (row.mark_price, row.cost_basis_price) {
                    (Some(mark), Some(cost)) => Some((mark - cost) * row.quantity),
                    _ => None,
                },
            };
            let pl_pct = match (row.mark_price, row.cost_basis_price) {
                (Some(mark), Some(cost)) if !cost.is_zero() => Some(mark / cost - Decimal::ONE),
                _ => None,
            };
            EnrichedPosition {
                account_id: row.account_id.clone().unwrap_or_default(),
                symbol: row.symbol.clone(),
                conid: row.conid,
                name: row.name.clone(),
                side: row.side_label().to_string(),
                quantity: row.quantity,
                avg_cost: row.cost_basis_price.unwrap_or_default(),
                currency: row.currency.clone(),
                base_currency: base_currency.clone(),
                current_price: row.mark_price,
                current_price_currency: row.currency.clone(),
                price_status: if row.price_as_of.is_some() {
                    PriceStatus::Fresh
                } else {
                    PriceStatus::Unavailable
                },
                price_as_of: row.price_as_of,
                market_value,
                pl_abs,
                pl_pct,
                weight: None,
                date_added: row.date_added(),
                mark_price: row.mark_price,
                cost_basis_price: row.cost_basis_price,
                cost_basis_money: row.cost_basis_money,
                position_value: row.position_value,
                fx_rate_to_base: row.fx_rate_to_base,
                report_date: row.report_date.clone(),
                date_open: row.date_open.clone(),
            }
        })
        .collect();
    apply_weights(&mut positions);

    let (cash_report, cash_base_summary) = split_cash_rows(snapshot.cash_balances.iter().map(|r| {
        (
            Some(r.currency.clone()),
            r.ending_cash,
            r.level_of_detail.clone(),
        )
    }));
    let cash_reconciliation = Some(reconcile_cash(
        &cash_report,
        cash_base_summary,
        &fx_rates_derived,
    ));

    let counts = PipelineCounts {
        parsed_trades: 0,
        upserted_trades: 0,
        positions: positions.len(),
    };

    PortfolioView {
        base_currency: base_currency.clone(),
        as_of_statement: snapshot.last_updated,
        positions,
        trades: Vec::new(),
        counts,
        cash_report,
        cash_base_summary,
        cash_reconciliation,
        fx_rates_derived,
        account: Some(AccountInformation {
            currency: Some(base_currency),
            ..Default::default()
        }),
        stale: snapshot.stale,
        warning: None,
    }
}
