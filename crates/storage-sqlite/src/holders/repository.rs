use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use flexfolio_core::errors::{DatabaseError, Error, Result};
use flexfolio_core::holders::{Holder, HolderRepositoryTrait};

use super::model::HolderDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::holders;
use crate::utils::timestamp_to_text;

pub struct HolderRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl HolderRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl HolderRepositoryTrait for HolderRepository {
    fn get_holder(&self, holder_id: &str) -> Result<Holder> {
        let mut conn = get_connection(&self.pool)?;
        let row = holders::table
            .find(holder_id)
            .select(HolderDB::as_select())
            .first::<HolderDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("holder {holder_id}")))
            })?;
        Ok(Holder::from(row))
    }

    async fn upsert_holder(&self, holder: Holder) -> Result<Holder> {
        let row = HolderDB::from(&holder);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(holders::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(Holder::from(row))
            })
            .await
    }

    async fn set_credentials(
        &self,
        holder_id: &str,
        flex_token_enc: &str,
        flex_query_id_enc: &str,
    ) -> Result<()> {
        let id = holder_id.to_string();
        let token = flex_token_enc.to_string();
        let query = flex_query_id_enc.to_string();
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(holders::table.find(&id))
                    .set((
                        holders::flex_token_enc.eq(&token),
                        holders::flex_query_id_enc.eq(&query),
                        holders::updated_at.eq(timestamp_to_text(Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "holder {id}"
                    ))));
                }
                Ok(())
            })
            .await
    }

    async fn set_base_currency(&self, holder_id: &str, currency: &str) -> Result<()> {
        let id = holder_id.to_string();
        let currency = currency.to_uppercase();
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(holders::table.find(&id))
                    .set((
                        holders::base_currency.eq(&currency),
                        holders::updated_at.eq(timestamp_to_text(Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "holder {id}"
                    ))));
                }
                Ok(())
            })
            .await
    }
}
