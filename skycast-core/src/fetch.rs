//! Concurrent HTTP fetch stage.
//!
//! [`Fetcher::fetch_all`] never fails as a whole: each request yields its
//! own `Result`, in the same position as the request that produced it.

use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, WeatherError};

/// Identifies this client to the provider on every request.
pub const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

/// One GET request: URL, query pairs and extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl RequestSpec {
    pub fn get<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: vec![("User-Agent", USER_AGENT.to_string())],
        }
    }

    pub fn query<V: ToString>(mut self, key: &'static str, value: V) -> Self {
        self.query.push((key, value.to_string()));
        self
    }
}

pub type FetchResult = Result<String>;

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: Client,
    request_timeout: Duration,
}

impl Fetcher {
    /// `request_timeout` bounds each individual request.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| WeatherError::configuration(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            request_timeout,
        })
    }

    /// Replace the per-request bound, keeping the connection pool.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Run every request concurrently and wait for all of them.
    pub async fn fetch_all(&self, requests: &[RequestSpec]) -> Vec<FetchResult> {
        join_all(requests.iter().map(|request| self.fetch_one(request))).await
    }

    /// Like [`Fetcher::fetch_all`], bounded by `timeout`.
    ///
    /// On timeout the in-flight requests are dropped and a transport error
    /// is returned instead of any partial results.
    pub async fn fetch_all_within(
        &self,
        requests: &[RequestSpec],
        timeout: Duration,
    ) -> Result<Vec<FetchResult>> {
        tokio::time::timeout(timeout, self.fetch_all(requests))
            .await
            .map_err(|_| {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "fetch join timed out");
                WeatherError::timeout(timeout)
            })
    }

    async fn fetch_one(&self, request: &RequestSpec) -> FetchResult {
        tracing::debug!(url = %request.url, "sending request");

        let mut builder = self
            .http
            .get(&request.url)
            .query(&request.query)
            .timeout(self.request_timeout);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let res = builder
            .send()
            .await
            .map_err(|e| WeatherError::transport(format!("{}: {e}", request.url)))?;

        let status = res.status();

        if !status.is_success() {
            tracing::debug!(url = %request.url, status = status.as_u16(), "request rejected");
            // the status alone decides the kind; an unreadable body only loses the message
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::protocol(status.as_u16(), rejection_message(&body)));
        }

        res.text()
            .await
            .map_err(|e| WeatherError::transport(format!("reading {}: {e}", request.url)))
    }
}

#[derive(Debug, Deserialize)]
struct ProviderRejection {
    message: String,
}

/// The provider's own `message` when the body carries one, else the raw body.
fn rejection_message(body: &str) -> String {
    match serde_json::from_str::<ProviderRejection>(body) {
        Ok(rejection) => rejection.message,
        Err(_) => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_spec_carries_identification_header() {
        let req = RequestSpec::get("http://localhost/x").query("lat", 1.5);
        assert_eq!(req.query, vec![("lat", "1.5".to_string())]);
        assert!(req
            .headers
            .iter()
            .any(|(name, value)| *name == "User-Agent" && value.starts_with("skycast/")));
    }

    #[test]
    fn rejection_prefers_provider_message() {
        let body = r#"{"cod":401,"message":"Invalid API key."}"#;
        assert_eq!(rejection_message(body), "Invalid API key.");
    }

    #[test]
    fn rejection_falls_back_to_truncated_body() {
        let body = "x".repeat(500);
        let msg = rejection_message(&body);
        assert_eq!(msg.len(), 203);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(300);
        let msg = truncate_body(&body);
        assert_eq!(msg.chars().count(), 203);
    }
}
