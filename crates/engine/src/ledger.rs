//! External ledger client.
//!
//! The reconciliation engine talks to the treasury's external ledger through
//! the [`LedgerClient`] trait; [`HttpLedgerClient`] is the production
//! implementation. Calls are bounded by a 10 second timeout and any
//! transport failure is a soft failure: sync truncates, logs, and moves on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::{EngineError, ResultEngine};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Transfer kind carried by inbound donation-type entries; everything else
/// is ignored by reconciliation.
pub const DONATION_KIND: &str = "donation";

/// One entry of the treasury account's transfer history.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Transfer {
    pub external_id: i64,
    pub sender_account_id: i64,
    pub amount_minor: i64,
    pub kind: String,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Transfer {
    pub fn is_inbound_donation(&self) -> bool {
        self.kind == DONATION_KIND && self.amount_minor > 0
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch one page of the account's transfer history. Pages start at 1;
    /// an empty page means the history is exhausted.
    async fn fetch_transfer_page(
        &self,
        credential: &str,
        account_id: i64,
        page: u32,
    ) -> ResultEngine<Vec<Transfer>>;

    /// Best-effort display-name lookup for an unknown sender. `None` on any
    /// failure; the caller substitutes a placeholder.
    async fn resolve_display_name(&self, account_id: i64) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    name: String,
}

/// HTTP implementation of [`LedgerClient`].
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str, user_agent: &str) -> ResultEngine<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|err| EngineError::ExternalFetch(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn fetch_transfer_page(
        &self,
        credential: &str,
        account_id: i64,
        page: u32,
    ) -> ResultEngine<Vec<Transfer>> {
        let url = format!("{}/accounts/{account_id}/transfers", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("page", page)])
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|err| EngineError::ExternalFetch(err.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|err| EngineError::ExternalFetch(err.to_string()))?;

        response
            .json::<Vec<Transfer>>()
            .await
            .map_err(|err| EngineError::ExternalFetch(err.to_string()))
    }

    async fn resolve_display_name(&self, account_id: i64) -> Option<String> {
        let url = format!("{}/accounts/{account_id}", self.base_url);
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("display-name lookup failed for {account_id}: {err}");
                return None;
            }
        };

        match response.json::<AccountInfo>().await {
            Ok(info) => Some(info.name),
            Err(err) => {
                tracing::warn!("display-name lookup failed for {account_id}: {err}");
                None
            }
        }
    }
}
