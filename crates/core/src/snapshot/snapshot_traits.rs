use async_trait::async_trait;

use super::snapshot_model::{CachedPosition, CashBalance};
use crate::errors::Result;

/// Persistence seam for the per-holder snapshot cache.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Cached positions for the holder, most recently updated first.
    fn get_positions(&self, holder_id: &str) -> Result<Vec<CachedPosition>>;

    /// Cached cash rows for the holder. Best-effort: a missing relation
    /// yields an empty set, not an error.
    fn get_cash_balances(&self, holder_id: &str) -> Result<Vec<CashBalance>>;

    /// Atomically upserts the fresh rows and sweeps rows whose key is
    /// absent from the fresh set, for both tables. Cash persistence inside
    /// the transaction is best-effort and must not abort the position
    /// writes. Returns the number of position rows upserted.
    async fn replace_snapshot(
        &self,
        holder_id: &str,
        positions: Vec<CachedPosition>,
        cash_balances: Vec<CashBalance>,
    ) -> Result<usize>;
}
