use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;

use flexfolio_core::errors::Result;
use flexfolio_core::positions::{PositionCalc, PositionRepositoryTrait};

use super::model::PositionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::positions;

pub struct PositionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PositionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PositionRepositoryTrait for PositionRepository {
    async fn upsert_positions(&self, batch: &[PositionCalc]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let rows: Vec<PositionDB> = batch.iter().map(PositionDB::from).collect();
        self.writer
            .exec(move |conn| {
                let written = diesel::replace_into(positions::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                debug!("upserted {written} reconciled positions");
                Ok(written)
            })
            .await
    }

    fn get_positions(&self, account_id: Option<&str>) -> Result<Vec<PositionCalc>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = positions::table.into_boxed();
        if let Some(account) = account_id {
            query = query.filter(positions::account_id.eq(account.to_string()));
        }
        let rows = query
            .order((positions::account_id.asc(), positions::conid.asc()))
            .load::<PositionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(PositionCalc::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init, spawn_writer};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn calc(conid: i64, quantity: rust_decimal::Decimal) -> PositionCalc {
        PositionCalc {
            account_id: "U1234567".to_string(),
            conid,
            symbol: "ACME".to_string(),
            currency: "USD".to_string(),
            quantity,
            avg_cost_base: dec!(10.01),
            date_added: None,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_by_account_and_conid() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let repo = PositionRepository::new(pool.clone(), spawn_writer(pool).unwrap());

        repo.upsert_positions(&[calc(1, dec!(100))]).await.unwrap();
        repo.upsert_positions(&[calc(1, dec!(60)), calc(2, dec!(5))])
            .await
            .unwrap();

        let stored = repo.get_positions(Some("U1234567")).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].quantity, dec!(60));
        assert_eq!(stored[1].conid, 2);
    }
}
