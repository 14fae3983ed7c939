use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SNAPSHOT_TTL_MINUTES,
};

/// Which endpoint family to try first when fetching a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointPreference {
    #[default]
    Web,
    Universal,
}

impl EndpointPreference {
    /// Case-insensitive parse; unrecognized values fall back to the default
    /// try order.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "universal" => EndpointPreference::Universal,
            _ => EndpointPreference::Web,
        }
    }
}

/// Recognized configuration options for the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlexSettings {
    /// Fallback reporting currency when the statement carries none.
    pub base_currency: String,
    pub endpoint_preference: EndpointPreference,
    pub snapshot_ttl_minutes: i64,
    pub request_timeout_secs: u64,
}

impl Default for FlexSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            endpoint_preference: EndpointPreference::default(),
            snapshot_ttl_minutes: DEFAULT_SNAPSHOT_TTL_MINUTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl FlexSettings {
    /// Snapshot TTL; non-positive configured values fall back to the default.
    pub fn snapshot_ttl(&self) -> chrono::Duration {
        let minutes = if self.snapshot_ttl_minutes > 0 {
            self.snapshot_ttl_minutes
        } else {
            DEFAULT_SNAPSHOT_TTL_MINUTES
        };
        chrono::Duration::minutes(minutes)
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = if self.request_timeout_secs > 0 {
            self.request_timeout_secs
        } else {
            DEFAULT_REQUEST_TIMEOUT_SECS
        };
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_parses_case_insensitively() {
        assert_eq!(
            EndpointPreference::parse_or_default("UNIVERSAL"),
            EndpointPreference::Universal
        );
        assert_eq!(
            EndpointPreference::parse_or_default("web"),
            EndpointPreference::Web
        );
        assert_eq!(
            EndpointPreference::parse_or_default("bogus"),
            EndpointPreference::Web
        );
    }

    #[test]
    fn invalid_ttl_falls_back() {
        let settings = FlexSettings {
            snapshot_ttl_minutes: 0,
            ..Default::default()
        };
        assert_eq!(settings.snapshot_ttl(), chrono::Duration::minutes(15));
    }
}
