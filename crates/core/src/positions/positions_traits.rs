use async_trait::async_trait;

use super::positions_model::PositionCalc;
use crate::errors::Result;

/// Persistence seam for reconciled positions.
#[async_trait]
pub trait PositionRepositoryTrait: Send + Sync {
    /// Upserts by (account, conid). Returns the number of rows written.
    async fn upsert_positions(&self, positions: &[PositionCalc]) -> Result<usize>;

    /// Reconciled positions, optionally restricted to one account.
    fn get_positions(&self, account_id: Option<&str>) -> Result<Vec<PositionCalc>>;
}
