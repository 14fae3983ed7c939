//! Stale-while-revalidate snapshot cache with single-flight refresh.
//!
//! Reads always serve the latest persisted snapshot immediately. When the
//! snapshot age exceeds the TTL, a refresh is spawned in the background; at
//! most one refresh runs per holder at any time, concurrent attempts no-op.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashSet;
use log::{debug, info, warn};

use flexfolio_core::constants::SNAPSHOT_ASSET_CATEGORIES;
use flexfolio_core::errors::{Error, Result};
use flexfolio_core::flex::{parse_statement, FlexCredentials, FlexFetcherTrait};
use flexfolio_core::holders::HolderRepositoryTrait;
use flexfolio_core::portfolio::{assemble_snapshot_view, PortfolioView};
use flexfolio_core::secrets::CredentialCipher;
use flexfolio_core::settings::FlexSettings;
use flexfolio_core::snapshot::{
    CachedPosition, CashBalance, HolderSnapshot, RefreshOutcome, SnapshotRepositoryTrait,
};

/// Removes the holder from the in-flight set on every exit path.
struct InFlightGuard<'a> {
    set: &'a DashSet<String>,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(self.key);
    }
}

#[derive(Clone)]
pub struct SnapshotCacheService {
    holder_repository: Arc<dyn HolderRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    fetcher: Arc<dyn FlexFetcherTrait>,
    cipher: Arc<CredentialCipher>,
    settings: FlexSettings,
    refreshing: Arc<DashSet<String>>,
}

impl SnapshotCacheService {
    pub fn new(
        holder_repository: Arc<dyn HolderRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        fetcher: Arc<dyn FlexFetcherTrait>,
        cipher: Arc<CredentialCipher>,
        settings: FlexSettings,
    ) -> Self {
        Self {
            holder_repository,
            snapshot_repository,
            fetcher,
            cipher,
            settings,
            refreshing: Arc::new(DashSet::new()),
        }
    }

    /// Serves the cached snapshot, triggering a detached refresh when it is
    /// stale. The caller never waits for the refresh.
    pub async fn get_snapshot(&self, holder_id: &str) -> Result<HolderSnapshot> {
        let holder = self.holder_repository.get_holder(holder_id)?;
        let base_currency = holder
            .base_currency
            .unwrap_or_else(|| self.settings.base_currency.clone())
            .to_uppercase();

        let positions = self.snapshot_repository.get_positions(holder_id)?;
        let cash_balances = self.snapshot_repository.get_cash_balances(holder_id)?;

        let last_updated = positions
            .iter()
            .map(|row| row.updated_at)
            .chain(cash_balances.iter().map(|row| row.updated_at))
            .max();
        let stale = match last_updated {
            Some(ts) => Utc::now() - ts > self.settings.snapshot_ttl(),
            None => true,
        };

        if stale && !self.refreshing.contains(holder_id) {
            let service = self.clone();
            let holder_id = holder_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = service.refresh(&holder_id).await {
                    warn!("background snapshot refresh for holder {holder_id} failed: {e}");
                }
            });
        }

        Ok(HolderSnapshot {
            base_currency,
            last_updated,
            stale,
            positions,
            cash_balances,
        })
    }

    /// The cached snapshot assembled into the served portfolio shape.
    pub async fn get_view(&self, holder_id: &str) -> Result<PortfolioView> {
        let snapshot = self.get_snapshot(holder_id).await?;
        Ok(assemble_snapshot_view(&snapshot))
    }

    /// Fetches a fresh statement and replaces the holder's cached rows.
    ///
    /// Single-flight per holder: a concurrent call while one is in flight
    /// returns zero updates without touching the network.
    pub async fn refresh(&self, holder_id: &str) -> Result<RefreshOutcome> {
        if !self.refreshing.insert(holder_id.to_string()) {
            debug!("snapshot refresh already in flight for holder {holder_id}");
            return Ok(RefreshOutcome { updated: 0 });
        }
        let _guard = InFlightGuard {
            set: self.refreshing.as_ref(),
            key: holder_id,
        };
        self.do_refresh(holder_id).await
    }

    async fn do_refresh(&self, holder_id: &str) -> Result<RefreshOutcome> {
        let holder = self.holder_repository.get_holder(holder_id)?;
        let (Some(token_enc), Some(query_enc)) = (
            holder.flex_token_enc.as_deref().filter(|v| !v.is_empty()),
            holder
                .flex_query_id_enc
                .as_deref()
                .filter(|v| !v.is_empty()),
        ) else {
            return Err(Error::CredentialsMissing(holder_id.to_string()));
        };
        let credentials = FlexCredentials {
            token: self.cipher.decrypt(token_enc)?,
            query_id: self.cipher.decrypt(query_enc)?,
        };

        let raw = self.fetcher.fetch_statement(&credentials).await?;
        let statement = parse_statement(&raw)?;

        let now = Utc::now();
        let price_as_of = statement.info.generated_at();

        let positions: Vec<CachedPosition> = statement
            .open_positions
            .iter()
            .filter(|record| {
                record
                    .asset_category
                    .as_deref()
                    .map(|cat| SNAPSHOT_ASSET_CATEGORIES.contains(&cat.to_uppercase().as_str()))
                    .unwrap_or(false)
            })
            .filter_map(|record| {
                CachedPosition::from_open_position(holder_id, record, price_as_of, now)
            })
            .collect();
        let cash_balances: Vec<CashBalance> = statement
            .cash_report
            .iter()
            .filter_map(|row| CashBalance::from_cash_report(holder_id, row, now))
            .collect();

        let updated = self
            .snapshot_repository
            .replace_snapshot(holder_id, positions, cash_balances)
            .await?;
        info!("refreshed snapshot for holder {holder_id}: {updated} positions");
        Ok(RefreshOutcome { updated })
    }
}
