use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use budget_core::AccountSet;
use budget_ingest::parse_account_set;
use budget_reconcile::FinanceClient;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::SimpleFinEndpoint;

const TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the SimpleFIN `/accounts` endpoint.
pub struct SimpleFinClient {
    http: reqwest::Client,
    endpoint: SimpleFinEndpoint,
}

impl SimpleFinClient {
    pub fn new(endpoint: SimpleFinEndpoint) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self { http, endpoint })
    }

    /// `GET {base}/accounts?pending=1&start-date=<unix>` with basic auth.
    fn accounts_request(&self, start: DateTime<Utc>) -> reqwest::Result<reqwest::Request> {
        let mut req = self
            .http
            .get(format!("{}/accounts", self.endpoint.base_url))
            .query(&[
                ("pending", "1".to_string()),
                ("start-date", start.timestamp().to_string()),
            ]);
        if !self.endpoint.username.is_empty() {
            req = req.basic_auth(&self.endpoint.username, Some(&self.endpoint.password));
        }
        req.build()
    }
}

#[async_trait]
impl FinanceClient for SimpleFinClient {
    async fn fetch_accounts(&self, start: DateTime<Utc>) -> Result<AccountSet> {
        let req = self.accounts_request(start).context("build SimpleFIN request")?;
        let resp = self.http.execute(req).await.context("SimpleFIN request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("SimpleFIN API returned status {status}: {txt}");
        }

        let body = resp.text().await.context("read SimpleFIN response body")?;
        let accounts = parse_account_set(&body)?;
        tracing::info!("Fetched {} accounts", accounts.accounts.len());
        Ok(accounts)
    }
}
