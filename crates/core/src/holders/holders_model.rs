use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account owner with portfolio settings and encrypted Flex credentials.
///
/// Credential blobs are opaque here; only the credential cipher can read
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub id: String,
    pub base_currency: Option<String>,
    pub flex_token_enc: Option<String>,
    pub flex_query_id_enc: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Holder {
    pub fn has_credentials(&self) -> bool {
        self.flex_token_enc.as_deref().is_some_and(|v| !v.is_empty())
            && self
                .flex_query_id_enc
                .as_deref()
                .is_some_and(|v| !v.is_empty())
    }
}
