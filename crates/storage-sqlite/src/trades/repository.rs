use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;

use flexfolio_core::errors::Result;
use flexfolio_core::trades::{NormalizedTrade, TradeRepositoryTrait};

use super::model::TradeDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::trades;

pub struct TradeRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TradeRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl TradeRepositoryTrait for TradeRepository {
    async fn upsert_trades(&self, batch: &[NormalizedTrade]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let rows: Vec<TradeDB> = batch.iter().map(TradeDB::from).collect();
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for row in &rows {
                    // Re-fetched statements carry the same executions; the
                    // dedup key makes the insert a no-op then.
                    written += diesel::insert_into(trades::table)
                        .values(row)
                        .on_conflict(trades::trade_key)
                        .do_nothing()
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                debug!("upserted {written} of {} trades", rows.len());
                Ok(written)
            })
            .await
    }

    fn get_trades(&self, account_id: Option<&str>) -> Result<Vec<NormalizedTrade>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = trades::table.into_boxed();
        if let Some(account) = account_id {
            query = query.filter(trades::account_id.eq(account.to_string()));
        }
        let rows = query
            .order(trades::exec_ts.asc())
            .load::<TradeDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(NormalizedTrade::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init, spawn_writer};
    use chrono::{Duration, TimeZone, Utc};
    use flexfolio_core::trades::TradeSide;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_trade(key: &str, minutes: i64) -> NormalizedTrade {
        NormalizedTrade {
            trade_key: key.to_string(),
            ib_exec_id: Some(key.to_string()),
            trade_id: None,
            account_id: "U1234567".to_string(),
            symbol: "ACME".to_string(),
            conid: 265598,
            side: TradeSide::Buy,
            quantity: dec!(100),
            trade_price: dec!(10.5),
            fees: dec!(1.35),
            currency: "USD".to_string(),
            fx_rate_to_base: dec!(0.92),
            exec_ts: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap()
                + Duration::minutes(minutes),
            trade_date: Some("20240115".to_string()),
            listing_exchange: Some("NASDAQ".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_trade_key() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let repo = TradeRepository::new(pool.clone(), spawn_writer(pool).unwrap());

        let batch = vec![sample_trade("ibExec:a", 0), sample_trade("ibExec:b", 1)];
        assert_eq!(repo.upsert_trades(&batch).await.unwrap(), 2);
        // Same executions again: nothing new is written.
        assert_eq!(repo.upsert_trades(&batch).await.unwrap(), 0);

        let stored = repo.get_trades(None).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].quantity, dec!(100));
        assert_eq!(stored[0].fx_rate_to_base, dec!(0.92));
    }

    #[tokio::test]
    async fn trades_come_back_in_execution_order() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let repo = TradeRepository::new(pool.clone(), spawn_writer(pool).unwrap());

        // Inserted newest first; read back chronologically.
        let batch = vec![sample_trade("ibExec:late", 10), sample_trade("ibExec:early", 0)];
        repo.upsert_trades(&batch).await.unwrap();

        let stored = repo.get_trades(Some("U1234567")).unwrap();
        assert_eq!(stored[0].trade_key, "ibExec:early");
        assert_eq!(stored[1].trade_key, "ibExec:late");
        assert!(repo.get_trades(Some("U0000000")).unwrap().is_empty());
    }
}
