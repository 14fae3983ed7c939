//! The statement-to-view pipeline: fetch, parse, normalize, persist,
//! reconcile, assemble.
//!
//! Persistence is best-effort. When the database is unavailable the
//! pipeline reconciles the in-memory batch instead, so a broken store
//! degrades the view (no history beyond this statement) without taking it
//! down.

use std::sync::Arc;

use log::{debug, warn};

use flexfolio_core::errors::Result;
use flexfolio_core::flex::{parse_statement, FlexCredentials, FlexFetcherTrait};
use flexfolio_core::portfolio::{assemble_statement_view, PortfolioView, StatementViewInput};
use flexfolio_core::positions::{rebuild_positions, PositionRepositoryTrait};
use flexfolio_core::settings::FlexSettings;
use flexfolio_core::trades::{normalize_trades, NormalizedTrade, TradeRepositoryTrait};

pub struct PortfolioService {
    fetcher: Arc<dyn FlexFetcherTrait>,
    trade_repository: Arc<dyn TradeRepositoryTrait>,
    position_repository: Arc<dyn PositionRepositoryTrait>,
    settings: FlexSettings,
}

impl PortfolioService {
    pub fn new(
        fetcher: Arc<dyn FlexFetcherTrait>,
        trade_repository: Arc<dyn TradeRepositoryTrait>,
        position_repository: Arc<dyn PositionRepositoryTrait>,
        settings: FlexSettings,
    ) -> Self {
        Self {
            fetcher,
            trade_repository,
            position_repository,
            settings,
        }
    }

    /// Fetches the latest statement and builds the consolidated view,
    /// optionally restricted to one account.
    pub async fn build_portfolio(
        &self,
        credentials: &FlexCredentials,
        account_id: Option<&str>,
    ) -> Result<PortfolioView> {
        let raw = self.fetcher.fetch_statement(credentials).await?;
        let statement = parse_statement(&raw)?;
        let outcome = normalize_trades(&statement.trades, &statement.taxes);
        debug!(
            "normalized {} trades ({} skipped) from {} raw records",
            outcome.trades.len(),
            outcome.skips.total(),
            statement.trades.len()
        );

        let batch: Vec<NormalizedTrade> = match account_id {
            Some(account) => outcome
                .trades
                .iter()
                .filter(|t| t.account_id == account)
                .cloned()
                .collect(),
            None => outcome.trades.clone(),
        };

        // Persist and reload the full ledger so reconciliation covers
        // history beyond this statement's window.
        let mut upserted = 0;
        let mut db_available = false;
        let mut ledger: Option<Vec<NormalizedTrade>> = None;
        match self.trade_repository.upsert_trades(&batch).await {
            Ok(count) => {
                upserted = count;
                db_available = true;
                match self.trade_repository.get_trades(account_id) {
                    Ok(rows) => ledger = Some(rows),
                    Err(e) => warn!("trade ledger read failed; using in-memory batch: {e}"),
                }
            }
            Err(e) => warn!("trade upsert failed; using in-memory batch: {e}"),
        }

        let mut trades_for_rebuild = ledger.unwrap_or_else(|| batch.clone());
        // Average-cost folding needs chronological order; sort defensively
        // rather than trusting store or statement order.
        trades_for_rebuild.sort_by_key(|t| t.exec_ts);

        let positions = rebuild_positions(&self.settings.base_currency, &trades_for_rebuild);
        if db_available {
            if let Err(e) = self.position_repository.upsert_positions(&positions).await {
                warn!("position upsert failed; serving unpersisted view: {e}");
            }
        }

        Ok(assemble_statement_view(StatementViewInput {
            statement: &statement,
            positions: &positions,
            trades: &batch,
            upserted_trades: upserted,
            default_base_currency: &self.settings.base_currency,
        }))
    }
}
