//! Two-step statement fetch against the Flex reporting endpoints.
//!
//! Two endpoint families expose the same SendRequest/GetStatement protocol:
//! the Universal servlet and the Flex Web Service. The configured
//! preference picks the family to try first; on failure the other family is
//! attempted and the last error wins.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};

use super::flex_errors::{codes, FlexError};
use super::protocol;
use crate::settings::EndpointPreference;

const BASE_UNIVERSAL: &str = "https://gdcdyn.interactivebrokers.com/Universal/servlet";
const BASE_WEBSERVICE: &str = "https://ndcdyn.interactivebrokers.com/AccountManagement/FlexWebService";

const USER_AGENT: &str = "Flexfolio/0.4";
const ACCEPT: &str = "application/xml, text/plain;q=0.9, */*;q=0.8";

/// Extra GetStatement attempts when the service answers "try again shortly".
const GET_POLL_ATTEMPTS: u32 = 2;
const GET_POLL_BACKOFF_MS: u64 = 800;

/// Access token and query identifier for one statement subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexCredentials {
    pub token: String,
    pub query_id: String,
}

/// Seam for the statement fetch, so orchestration services can be tested
/// without the network.
#[async_trait]
pub trait FlexFetcherTrait: Send + Sync {
    /// Fetches the raw statement document for the given credentials.
    async fn fetch_statement(&self, credentials: &FlexCredentials) -> Result<String, FlexError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Web,
    Universal,
}

pub struct FlexClient {
    http: Client,
    preference: EndpointPreference,
    timeout: Duration,
}

impl FlexClient {
    pub fn new(preference: EndpointPreference, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            preference,
            timeout,
        }
    }

    fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, FlexError> {
        Url::parse_with_params(&format!("{base}/{path}"), params)
            .map_err(|e| FlexError::new(format!("Failed to build request URL: {e}")))
    }

    async fn get_text(&self, step: &str, url: Url) -> Result<String, FlexError> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .header("User-Agent", USER_AGENT)
            .header("Accept", ACCEPT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FlexError::new(format!(
                        "{step} timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    FlexError::new(format!("{step} failed: {e}"))
                }
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FlexError::new(format!("{step} failed reading body: {e}")))?;
        if !status.is_success() {
            return Err(FlexError::new(format!("{step} failed: {status}")));
        }
        Ok(body)
    }

    async fn try_universal(&self, credentials: &FlexCredentials) -> Result<String, FlexError> {
        let send_url = Self::build_url(
            BASE_UNIVERSAL,
            "FlexStatementService.SendRequest",
            &[("t", &credentials.token), ("q", &credentials.query_id)],
        )?;
        let send_body = self.get_text("SendRequest", send_url.clone()).await?;
        let reference_code = match protocol::parse_send_response(&send_body) {
            Ok(code) => code,
            // One quick retry when the body was unparseable; definitive
            // protocol errors (HTML, expired token, status codes) are final.
            Err(err) if err.code.as_deref() == Some(codes::UNEXPECTED_FORMAT) => {
                debug!("SendRequest response not parseable; retrying once");
                let retry_body = self.get_text("SendRequest", send_url).await?;
                protocol::parse_send_response(&retry_body)?
            }
            Err(err) => return Err(err),
        };

        let get_url = Self::build_url(
            BASE_UNIVERSAL,
            "FlexStatementService.GetStatement",
            &[("t", &credentials.token), ("v", reference_code.as_str())],
        )?;
        let xml = self.get_text("GetStatement", get_url).await?;
        if let Some(err) = protocol::statement_error(&xml) {
            return Err(err);
        }
        Ok(xml)
    }

    async fn try_webservice(&self, credentials: &FlexCredentials) -> Result<String, FlexError> {
        // The web service requires the protocol version parameter.
        let send_url = Self::build_url(
            BASE_WEBSERVICE,
            "SendRequest",
            &[
                ("t", credentials.token.as_str()),
                ("q", credentials.query_id.as_str()),
                ("v", "3"),
            ],
        )?;
        let send_body = self.get_text("SendRequest", send_url).await?;
        let reference_code = protocol::parse_send_response(&send_body)?;

        // GetStatement takes the reference code in `q` here.
        let get_url = Self::build_url(
            BASE_WEBSERVICE,
            "GetStatement",
            &[
                ("t", credentials.token.as_str()),
                ("q", reference_code.as_str()),
                ("v", "3"),
            ],
        )?;

        let mut attempt = 0u32;
        loop {
            let xml = self.get_text("GetStatement", get_url.clone()).await?;
            match protocol::statement_error(&xml) {
                None => return Ok(xml),
                Some(err) if attempt < GET_POLL_ATTEMPTS && protocol::is_retryable(&err) => {
                    attempt += 1;
                    let backoff = GET_POLL_BACKOFF_MS * u64::from(attempt);
                    debug!("statement not ready ({err}); polling again in {backoff}ms");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Some(err) => return Err(err),
            }
        }
    }

    async fn try_family(
        &self,
        family: Family,
        credentials: &FlexCredentials,
    ) -> Result<String, FlexError> {
        match family {
            Family::Web => self.try_webservice(credentials).await,
            Family::Universal => self.try_universal(credentials).await,
        }
    }
}

#[async_trait]
impl FlexFetcherTrait for FlexClient {
    async fn fetch_statement(&self, credentials: &FlexCredentials) -> Result<String, FlexError> {
        let order = match self.preference {
            EndpointPreference::Universal => [Family::Universal, Family::Web],
            EndpointPreference::Web => [Family::Web, Family::Universal],
        };

        let mut last_error: Option<FlexError> = None;
        for family in order {
            match self.try_family(family, credentials).await {
                Ok(xml) => return Ok(xml),
                Err(err) => {
                    warn!("{family:?} Flex endpoint failed: {err}");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| FlexError::with_code("Failed to fetch Flex statement", codes::UNKNOWN)))
    }
}
