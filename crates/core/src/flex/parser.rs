//! Event-driven parser for the Flex statement XML payload.
//!
//! Every record is carried as attributes on a (usually self-closed)
//! element, so parsing is a single pass over start/empty events. A section
//! that is absent yields an empty collection; only malformed markup is an
//! error.

use std::collections::HashMap;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::flex_errors::ParseError;
use super::flex_model::{
    AccountInformation, CashReportCurrency, FlexStatement, FlexTrade, OpenPosition, ParseStats,
    StatementInfo, TransactionTax,
};
use crate::constants::{EXECUTION_LEVEL_OF_DETAIL, TRADE_ASSET_CATEGORIES};

/// Attribute bag for one element, with typed accessors.
struct Attrs(HashMap<String, String>);

impl Attrs {
    fn read(element: &BytesStart) -> Result<Self, ParseError> {
        let mut map = HashMap::new();
        for attr in element.attributes() {
            let attr =
                attr.map_err(|err| ParseError::Malformed(format!("bad attribute: {err}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| ParseError::Malformed(format!("bad attribute value: {err}")))?
                .into_owned();
            map.insert(key, value);
        }
        Ok(Self(map))
    }

    /// Returns the attribute, treating an empty string as absent.
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// First present attribute among spelling variants (`tradeID`/`tradeId`).
    fn get_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    fn decimal(&self, key: &str) -> Option<Decimal> {
        let value = self.get(key)?;
        Decimal::from_str(&value)
            .ok()
            .or_else(|| f64::from_str(&value).ok().and_then(Decimal::from_f64))
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|value| value.parse().ok())
    }
}

/// Parses a raw statement document into typed collections.
pub fn parse_statement(xml: &str) -> Result<FlexStatement, ParseError> {
    let mut reader = Reader::from_str(xml);

    let mut info = StatementInfo::default();
    let mut account: Option<AccountInformation> = None;
    let mut cash_report: Vec<CashReportCurrency> = Vec::new();
    let mut trade_tags: Vec<Attrs> = Vec::new();
    let mut taxes: Vec<TransactionTax> = Vec::new();
    let mut open_positions: Vec<OpenPosition> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                match element.name().as_ref() {
                    b"FlexStatement" => {
                        let attrs = Attrs::read(&element)?;
                        info = StatementInfo {
                            account_id: attrs.get("accountId"),
                            from_date: attrs.get("fromDate"),
                            to_date: attrs.get("toDate"),
                            when_generated: attrs.get("whenGenerated"),
                        };
                    }
                    b"AccountInformation" => {
                        let attrs = Attrs::read(&element)?;
                        account = Some(AccountInformation {
                            account_id: attrs.get("accountId"),
                            currency: attrs.get("currency"),
                            name: attrs.get("name"),
                            account_type: attrs.get("accountType"),
                            customer_type: attrs.get("customerType"),
                            master_name: attrs.get("masterName"),
                        });
                    }
                    b"CashReportCurrency" => {
                        let attrs = Attrs::read(&element)?;
                        cash_report.push(CashReportCurrency {
                            account_id: attrs.get("accountId"),
                            currency: attrs.get("currency"),
                            level_of_detail: attrs.get("levelOfDetail"),
                            from_date: attrs.get("fromDate"),
                            to_date: attrs.get("toDate"),
                            ending_cash: attrs.decimal("endingCash"),
                            ending_settled_cash: attrs.decimal("endingSettledCash"),
                        });
                    }
                    b"Trade" => {
                        trade_tags.push(Attrs::read(&element)?);
                    }
                    b"TransactionTax" => {
                        let attrs = Attrs::read(&element)?;
                        taxes.push(TransactionTax {
                            trade_id: attrs.get_any(&["tradeID", "tradeId"]),
                            order_id: attrs.get_any(&["orderID", "orderId"]),
                            tax_description: attrs.get("taxDescription"),
                            tax_amount: attrs.decimal("taxAmount"),
                            currency: attrs.get("currency"),
                            conid: attrs.int("conid"),
                            symbol: attrs.get("symbol"),
                            date: attrs.get("date"),
                        });
                    }
                    b"OpenPosition" => {
                        let attrs = Attrs::read(&element)?;
                        open_positions.push(parse_open_position(&attrs));
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ParseError::Malformed(err.to_string())),
            Ok(_) => {}
        }
    }

    // Trade candidates: execution-level fills in equity categories only.
    // Counts at each stage are kept for diagnostics.
    let total_trade_tags = trade_tags.len();
    let execution: Vec<Attrs> = trade_tags
        .into_iter()
        .filter(|attrs| {
            attrs
                .get("levelOfDetail")
                .map(|lod| lod.to_uppercase() == EXECUTION_LEVEL_OF_DETAIL)
                .unwrap_or(false)
        })
        .collect();
    let execution_trades = execution.len();
    let equities: Vec<Attrs> = execution
        .into_iter()
        .filter(|attrs| {
            attrs
                .get("assetCategory")
                .map(|cat| TRADE_ASSET_CATEGORIES.contains(&cat.to_uppercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    let equities_trades = equities.len();
    let trades: Vec<FlexTrade> = equities.iter().map(parse_trade).collect();

    let stats = ParseStats {
        total_trade_tags,
        execution_trades,
        equities_trades,
        taxes: taxes.len(),
    };
    debug!(
        "parsed statement for {:?}: {} trade tags, {} executions, {} equities, {} open positions",
        info.account_id,
        stats.total_trade_tags,
        stats.execution_trades,
        stats.equities_trades,
        open_positions.len()
    );

    Ok(FlexStatement {
        info,
        account,
        cash_report,
        trades,
        taxes,
        open_positions,
        stats,
    })
}

fn parse_trade(attrs: &Attrs) -> FlexTrade {
    FlexTrade {
        trade_id: attrs.get_any(&["tradeID", "tradeId"]),
        ib_exec_id: attrs.get_any(&["ibExecID", "ibExecId"]),
        account_id: attrs.get("accountId"),
        trade_date: attrs.get("tradeDate"),
        date_time: attrs.get("dateTime"),
        settle_date_target: attrs.get("settleDateTarget"),
        buy_sell: attrs.get("buySell"),
        quantity: attrs.decimal("quantity"),
        trade_price: attrs.decimal("tradePrice"),
        ib_commission: attrs.decimal("ibCommission"),
        net_cash: attrs.decimal("netCash"),
        cost: attrs.decimal("cost"),
        fifo_pnl_realized: attrs.decimal("fifoPnlRealized"),
        mtm_pnl: attrs.decimal("mtmPnl"),
        symbol: attrs.get("symbol"),
        description: attrs.get("description"),
        conid: attrs.int("conid"),
        asset_category: attrs.get("assetCategory"),
        sub_category: attrs.get("subCategory"),
        listing_exchange: attrs.get("listingExchange"),
        currency: attrs.get("currency"),
        fx_rate_to_base: attrs.decimal("fxRateToBase").unwrap_or(Decimal::ONE),
    }
}

fn parse_open_position(attrs: &Attrs) -> OpenPosition {
    OpenPosition {
        account_id: attrs.get("accountId"),
        currency: attrs.get("currency"),
        fx_rate_to_base: attrs.decimal("fxRateToBase"),
        asset_category: attrs.get("assetCategory"),
        sub_category: attrs.get("subCategory"),
        symbol: attrs.get("symbol"),
        description: attrs.get("description"),
        conid: attrs.int("conid"),
        listing_exchange: attrs.get("listingExchange"),
        report_date: attrs.get("reportDate"),
        position: attrs.decimal("position"),
        mark_price: attrs.decimal("markPrice"),
        position_value: attrs.decimal("positionValue"),
        open_price: attrs.decimal("openPrice"),
        cost_basis_price: attrs.decimal("costBasisPrice"),
        cost_basis_money: attrs.decimal("costBasisMoney"),
        side: attrs.get("side"),
        level_of_detail: attrs.get("levelOfDetail"),
        open_date_time: attrs.get("openDateTime"),
        holding_period_date_time: attrs.get("holdingPeriodDateTime"),
    }
}
