//! Portfolio module - the enriched, multi-currency view served to callers.

mod assembler;
mod portfolio_model;


pub use assembler::{
    assemble_snapshot_view, assemble_statement_view, derive_fx_rates, reconcile_cash,
    StatementViewInput,
};
pub use portfolio_model::{
    CashReconciliation, CashReportRow, EnrichedPosition, EnrichedTrade, PipelineCounts,
    PortfolioView, PriceStatus,
};
