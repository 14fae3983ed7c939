use async_trait::async_trait;

use super::holders_model::Holder;
use crate::errors::Result;

/// Persistence seam for holders and their encrypted credentials.
#[async_trait]
pub trait HolderRepositoryTrait: Send + Sync {
    fn get_holder(&self, holder_id: &str) -> Result<Holder>;

    /// Creates the holder row if absent, otherwise updates it.
    async fn upsert_holder(&self, holder: Holder) -> Result<Holder>;

    /// Stores freshly encrypted credential blobs for the holder.
    async fn set_credentials(
        &self,
        holder_id: &str,
        flex_token_enc: &str,
        flex_query_id_enc: &str,
    ) -> Result<()>;

    async fn set_base_currency(&self, holder_id: &str, currency: &str) -> Result<()>;
}
