//! Database model for holders.

use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use flexfolio_core::holders::Holder;

use crate::utils::{opt_text_to_timestamp, timestamp_to_text};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::holders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HolderDB {
    pub id: String,
    pub base_currency: Option<String>,
    pub flex_token_enc: Option<String>,
    pub flex_query_id_enc: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Holder> for HolderDB {
    fn from(holder: &Holder) -> Self {
        let now = Utc::now();
        Self {
            id: holder.id.clone(),
            base_currency: holder.base_currency.clone(),
            flex_token_enc: holder.flex_token_enc.clone(),
            flex_query_id_enc: holder.flex_query_id_enc.clone(),
            created_at: timestamp_to_text(holder.created_at.unwrap_or(now)),
            updated_at: timestamp_to_text(now),
        }
    }
}

impl From<HolderDB> for Holder {
    fn from(row: HolderDB) -> Self {
        Self {
            created_at: opt_text_to_timestamp(Some(row.created_at.as_str())),
            updated_at: opt_text_to_timestamp(Some(row.updated_at.as_str())),
            id: row.id,
            base_currency: row.base_currency,
            flex_token_enc: row.flex_token_enc,
            flex_query_id_enc: row.flex_query_id_enc,
        }
    }
}
