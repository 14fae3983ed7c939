//! Flex statement module - fetch protocol, document parser, and models.

mod client;
mod flex_errors;
mod flex_model;
mod parser;
mod protocol;

#[cfg(test)]
mod parser_tests;


pub use client::{FlexClient, FlexCredentials, FlexFetcherTrait};
pub use flex_errors::{codes, FlexError, ParseError};
pub use flex_model::{
    AccountInformation, CashReportCurrency, FlexStatement, FlexTrade, OpenPosition, ParseStats,
    StatementInfo, TransactionTax,
};
pub use parser::parse_statement;
pub use protocol::{is_retryable, parse_send_response, statement_error};
