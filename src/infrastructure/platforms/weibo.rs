//! Weibo timeline client.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::HttpTransport;
use crate::domain::errors::FetchError;
use crate::domain::models::{PlatformConfig, Post};
use crate::domain::ports::PlatformClient;

pub const DEFAULT_BASE_URL: &str = "https://weibo.com";
const TIMELINE_PATH: &str = "/ajax/statuses/mymblog";

/// `ok` value Weibo returns when the session cookie is missing or expired
const LOGIN_REQUIRED: i64 = -100;

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    ok: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TimelineData>,
}

#[derive(Debug, Deserialize)]
struct TimelineData {
    #[serde(default)]
    list: Vec<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    text_raw: String,
}

/// Fetches a user's own posts page by page.
pub struct WeiboClient {
    name: String,
    base_url: String,
    pages: u32,
    transport: HttpTransport,
}

impl WeiboClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            pages: config.pages.max(1),
            transport: HttpTransport::new(config)?,
        })
    }

    async fn fetch_page(&self, uid: &str, page: u32) -> Result<Vec<Post>, FetchError> {
        let url = format!("{}{TIMELINE_PATH}", self.base_url.trim_end_matches('/'));
        let query = [
            ("uid", uid.to_string()),
            ("page", page.to_string()),
            ("feature", "0".to_string()),
        ];
        let body = self.transport.get_text(&url, &query).await?;
        parse_timeline(&self.name, &body)
    }
}

fn parse_timeline(platform: &str, body: &str) -> Result<Vec<Post>, FetchError> {
    let response: TimelineResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Transient(format!("unparsable timeline: {e}")))?;

    if response.ok == LOGIN_REQUIRED {
        return Err(FetchError::Fatal(format!(
            "login required: {}",
            response.msg.unwrap_or_default()
        )));
    }

    let data = response.data.ok_or_else(|| {
        FetchError::Transient(format!(
            "timeline without data (ok={}): {}",
            response.ok,
            response.msg.unwrap_or_default()
        ))
    })?;

    Ok(data
        .list
        .into_iter()
        .map(|status| Post::new(platform, status.created_at, status.text_raw))
        .collect())
}

#[async_trait]
impl PlatformClient for WeiboClient {
    fn platform(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, external_id: &str) -> Result<Vec<Post>, FetchError> {
        let mut posts = Vec::new();
        for page in 1..=self.pages {
            let batch = self.fetch_page(external_id, page).await?;
            debug!(uid = external_id, page, count = batch.len(), "weibo page fetched");
            if batch.is_empty() {
                break;
            }
            posts.extend(batch);
        }
        Ok(posts)
    }
}
