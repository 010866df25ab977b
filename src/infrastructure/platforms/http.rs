//! Shared HTTP plumbing for platform clients.

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use tracing::debug;

use crate::domain::errors::FetchError;
use crate::domain::models::PlatformConfig;

/// Longest body excerpt kept in an error message
const BODY_EXCERPT: usize = 200;

/// HTTP client plus optional request pacing for one platform.
pub struct HttpTransport {
    client: Client,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl HttpTransport {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name '{name}' for {}", config.name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header '{name}' on {}", config.name))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        let limiter = config
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self { client, limiter })
    }

    /// GET `url` and return the body of a successful response.
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "platform response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        response.text().await.map_err(|e| transport_error(&e))
    }
}

/// Map a non-success HTTP status to a fetch failure.
pub fn status_error(status: StatusCode, body: &str) -> FetchError {
    let detail = format!("HTTP {}: {}", status.as_u16(), excerpt(body));
    match status.as_u16() {
        429 | 418 => FetchError::RateLimited(detail),
        500..=599 => FetchError::Transient(detail),
        _ => FetchError::Fatal(detail),
    }
}

/// Map a reqwest failure (no usable response) to a fetch failure.
pub fn transport_error(err: &reqwest::Error) -> FetchError {
    if let Some(status) = err.status() {
        return status_error(status, "");
    }
    if err.is_builder() {
        return FetchError::Fatal(format!("invalid request: {err}"));
    }
    if err.is_timeout() {
        return FetchError::Transient(format!("request timed out: {err}"));
    }
    FetchError::Transient(format!("network error: {err}"))
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
