use async_trait::async_trait;

use super::trades_model::NormalizedTrade;
use crate::errors::Result;

/// Persistence seam for the canonical trade ledger.
#[async_trait]
pub trait TradeRepositoryTrait: Send + Sync {
    /// Idempotent insert keyed by `trade_key`; rows that already exist are
    /// left untouched. Returns the number of rows written.
    async fn upsert_trades(&self, trades: &[NormalizedTrade]) -> Result<usize>;

    /// Full trade history, optionally restricted to one account, ordered by
    /// execution time ascending.
    fn get_trades(&self, account_id: Option<&str>) -> Result<Vec<NormalizedTrade>>;
}
