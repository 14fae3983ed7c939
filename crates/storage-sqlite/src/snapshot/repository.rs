use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};

use flexfolio_core::errors::{DatabaseError, Error, Result};
use flexfolio_core::snapshot::{CachedPosition, CashBalance, SnapshotRepositoryTrait};

use super::model::{CashBalanceDB, OpenPositionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{cash_balances, open_positions};

pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Upserts fresh cash rows and sweeps rows absent from the fresh key set.
fn replace_cash(
    conn: &mut SqliteConnection,
    holder: &str,
    fresh: &[CashBalanceDB],
) -> std::result::Result<(), StorageError> {
    let fresh_keys: HashSet<(String, String)> = fresh
        .iter()
        .map(|row| (row.currency.clone(), row.level_of_detail.clone()))
        .collect();

    for row in fresh {
        diesel::replace_into(cash_balances::table)
            .values(row)
            .execute(conn)?;
    }

    let existing: Vec<(String, String)> = cash_balances::table
        .filter(cash_balances::holder_id.eq(holder))
        .select((cash_balances::currency, cash_balances::level_of_detail))
        .load(conn)?;
    for (currency, level_of_detail) in existing {
        if fresh_keys.contains(&(currency.clone(), level_of_detail.clone())) {
            continue;
        }
        diesel::delete(
            cash_balances::table
                .filter(cash_balances::holder_id.eq(holder))
                .filter(cash_balances::currency.eq(currency))
                .filter(cash_balances::level_of_detail.eq(level_of_detail)),
        )
        .execute(conn)?;
    }
    Ok(())
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_positions(&self, holder_id: &str) -> Result<Vec<CachedPosition>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = open_positions::table
            .filter(open_positions::holder_id.eq(holder_id))
            .order(open_positions::updated_at.desc())
            .load::<OpenPositionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(CachedPosition::from).collect())
    }

    fn get_cash_balances(&self, holder_id: &str) -> Result<Vec<CashBalance>> {
        let mut conn = get_connection(&self.pool)?;
        let loaded = cash_balances::table
            .filter(cash_balances::holder_id.eq(holder_id))
            .order(cash_balances::updated_at.desc())
            .load::<CashBalanceDB>(&mut conn)
            .map_err(StorageError::from);
        match loaded {
            Ok(rows) => Ok(rows.into_iter().map(CashBalance::from).collect()),
            Err(err) => {
                let core: Error = err.into();
                if let Error::Database(db_err) = &core {
                    if db_err.is_missing_relation() {
                        warn!("cash_balances relation missing; serving empty cash set");
                        return Ok(Vec::new());
                    }
                }
                Err(core)
            }
        }
    }

    async fn replace_snapshot(
        &self,
        holder_id: &str,
        positions: Vec<CachedPosition>,
        cash_balances_fresh: Vec<CashBalance>,
    ) -> Result<usize> {
        let holder = holder_id.to_string();
        let position_rows: Vec<OpenPositionDB> =
            positions.iter().map(OpenPositionDB::from).collect();
        let cash_rows: Vec<CashBalanceDB> =
            cash_balances_fresh.iter().map(CashBalanceDB::from).collect();

        self.writer
            .exec(move |conn| {
                let fresh_conids: Vec<i64> = position_rows.iter().map(|row| row.conid).collect();

                let mut updated = 0usize;
                for row in &position_rows {
                    diesel::replace_into(open_positions::table)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    updated += 1;
                }
                // Instruments gone from the latest fetch are swept.
                let swept = diesel::delete(
                    open_positions::table
                        .filter(open_positions::holder_id.eq(&holder))
                        .filter(open_positions::conid.ne_all(&fresh_conids)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if swept > 0 {
                    debug!("swept {swept} stale cached positions for holder {holder}");
                }

                // Best-effort: a missing cash relation must not abort the
                // position writes.
                if let Err(e) = replace_cash(conn, &holder, &cash_rows) {
                    warn!("cash balance persistence skipped for holder {holder}: {e}");
                }

                Ok(updated)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init, spawn_writer};
    use chrono::{TimeZone, Utc};
    use diesel::sql_query;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn position(holder: &str, conid: i64) -> CachedPosition {
        CachedPosition {
            holder_id: holder.to_string(),
            conid,
            account_id: Some("U1234567".to_string()),
            symbol: format!("SYM{conid}"),
            name: None,
            currency: "USD".to_string(),
            quantity: dec!(10),
            mark_price: Some(dec!(11.25)),
            cost_basis_price: Some(dec!(10.01)),
            cost_basis_money: None,
            position_value: Some(dec!(112.5)),
            fx_rate_to_base: Some(dec!(0.92)),
            report_date: Some("20240131".to_string()),
            date_open: None,
            price_as_of: None,
            updated_at: Utc.with_ymd_and_hms(2024, 2, 1, 5, 31, 0).unwrap(),
        }
    }

    fn cash(holder: &str, currency: &str, level: Option<&str>) -> CashBalance {
        CashBalance {
            holder_id: holder.to_string(),
            account_id: None,
            currency: currency.to_string(),
            level_of_detail: level.map(str::to_string),
            ending_cash: Some(dec!(100)),
            ending_settled_cash: None,
            updated_at: Utc.with_ymd_and_hms(2024, 2, 1, 5, 31, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn replace_upserts_then_sweeps_both_tables() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let repo = SnapshotRepository::new(pool.clone(), spawn_writer(pool).unwrap());

        let first = repo
            .replace_snapshot(
                "42",
                vec![position("42", 1), position("42", 2)],
                vec![cash("42", "USD", Some("Currency")), cash("42", "EUR", None)],
            )
            .await
            .unwrap();
        assert_eq!(first, 2);

        // Next fetch no longer carries conid 2 or the EUR row.
        let second = repo
            .replace_snapshot(
                "42",
                vec![position("42", 1)],
                vec![cash("42", "USD", Some("Currency"))],
            )
            .await
            .unwrap();
        assert_eq!(second, 1);

        let positions = repo.get_positions("42").unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].conid, 1);

        let balances = repo.get_cash_balances("42").unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].currency, "USD");
        assert_eq!(balances[0].level_of_detail.as_deref(), Some("Currency"));
    }

    #[tokio::test]
    async fn holders_are_isolated_from_each_other() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let repo = SnapshotRepository::new(pool.clone(), spawn_writer(pool).unwrap());

        repo.replace_snapshot("42", vec![position("42", 1)], vec![])
            .await
            .unwrap();
        repo.replace_snapshot("43", vec![position("43", 9)], vec![])
            .await
            .unwrap();
        // An empty fetch for one holder sweeps only that holder's rows.
        repo.replace_snapshot("42", vec![], vec![]).await.unwrap();

        assert!(repo.get_positions("42").unwrap().is_empty());
        assert_eq!(repo.get_positions("43").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_cash_relation_degrades_gracefully() {
        let dir = TempDir::new().unwrap();
        let pool = init(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let writer = spawn_writer(pool.clone()).unwrap();
        let repo = SnapshotRepository::new(pool.clone(), writer);

        let mut conn = get_connection(&pool).unwrap();
        sql_query("DROP TABLE cash_balances")
            .execute(&mut conn)
            .unwrap();

        // Positions still persist even though the cash relation is gone.
        let updated = repo
            .replace_snapshot("42", vec![position("42", 1)], vec![cash("42", "USD", None)])
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(repo.get_positions("42").unwrap().len(), 1);
        assert!(repo.get_cash_balances("42").unwrap().is_empty());
    }
}
