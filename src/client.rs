/// HTTP client for the backend's `/api/data` usage endpoint.
/// Uses reqwest-middleware for retries.
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;
use url::Url;

use crate::dashboard::Granularity;
use crate::errors::AppError;
use crate::models::usage::{DataResponse, UsageRecord};

/// Parameters of one usage query.
#[derive(Debug, Clone)]
pub struct UsageQuery {
    /// Only used for the admin endpoint; empty means all users.
    pub username: Option<String>,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub granularity: Granularity,
    /// Query `/api/data/self/` (the caller's own usage) instead of the
    /// admin endpoint.
    pub self_only: bool,
}

pub struct BackendClient {
    client: ClientWithMiddleware,
    base_url: Url,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: &str, access_token: Option<String>, max_retries: u32) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid backend url '{}': {}", base_url, e))?;

        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    /// Full request URL for `query`.
    pub fn usage_url(&self, query: &UsageQuery) -> Result<Url, AppError> {
        let path = if query.self_only {
            "/api/data/self/"
        } else {
            "/api/data/"
        };
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::Internal(e.into()))?;

        {
            let mut pairs = url.query_pairs_mut();
            if !query.self_only {
                pairs.append_pair("username", query.username.as_deref().unwrap_or(""));
            }
            pairs
                .append_pair("start_timestamp", &query.start_timestamp.to_string())
                .append_pair("end_timestamp", &query.end_timestamp.to_string())
                .append_pair("default_time", query.granularity.as_str());
        }
        Ok(url)
    }

    /// Fetch the raw usage rows for `query`, ready for the pipeline.
    pub async fn fetch_usage(&self, query: &UsageQuery, now: i64) -> Result<Vec<UsageRecord>, AppError> {
        let url = self.usage_url(query)?;

        let mut request = self.client.get(url.as_str());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| {
            tracing::warn!("Backend usage request failed after retries: {}", e);
            AppError::Backend(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %url, "backend returned non-success status");
            return Err(AppError::Backend(format!("backend returned {}", status)));
        }

        let body: DataResponse = resp.json().await.map_err(|e| {
            tracing::warn!("Backend usage response could not be decoded: {}", e);
            AppError::Backend(e.to_string())
        })?;

        if !body.success {
            return Err(AppError::BackendRejected(body.message));
        }

        tracing::debug!(rows = body.data.len(), granularity = %query.granularity, "fetched usage rows");
        Ok(prepare_records(body.data, now))
    }
}

/// An empty result becomes a single "no data" row at `now` so the charts
/// still have something to draw; rows are then ordered by time.
pub fn prepare_records(mut records: Vec<UsageRecord>, now: i64) -> Vec<UsageRecord> {
    if records.is_empty() {
        records.push(UsageRecord::no_data(now));
    }
    records.sort_by_key(|r| r.created_at);
    records
}
