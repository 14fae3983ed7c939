//! Conversion helpers between domain types and their TEXT encodings.
//!
//! Decimals and timestamps are stored as strings; reads are tolerant, with
//! unparseable values logged and defaulted rather than failing the row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn decimal_to_text(value: Decimal) -> String {
    value.to_string()
}

pub fn text_to_decimal(value: &str, field: &str) -> Decimal {
    match Decimal::from_str(value) {
        Ok(d) => d,
        Err(e) => {
            log::error!("failed to parse {field} '{value}' as decimal: {e}; defaulting to zero");
            Decimal::ZERO
        }
    }
}

pub fn opt_decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(|v| v.to_string())
}

pub fn opt_text_to_decimal(value: Option<&str>) -> Option<Decimal> {
    value.and_then(|v| Decimal::from_str(v).ok())
}

pub fn timestamp_to_text(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn text_to_timestamp(value: &str, field: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            log::error!("failed to parse {field} '{value}' as timestamp: {e}; defaulting to now");
            Utc::now()
        }
    }
}

pub fn opt_text_to_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|ts| ts.with_timezone(&Utc))
}
