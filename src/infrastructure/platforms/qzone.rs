//! Qzone message board client.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::http::HttpTransport;
use crate::domain::errors::FetchError;
use crate::domain::models::{PlatformConfig, Post};
use crate::domain::ports::PlatformClient;

pub const DEFAULT_BASE_URL: &str = "https://user.qzone.qq.com";
const MSGLIST_PATH: &str = "/proxy/domain/taotao.qq.com/cgi-bin/emotion_cgi_msglist_v6";
const CALLBACK: &str = "_preloadCallback";
const PAGE_SIZE: u32 = 20;

/// `code` returned when the session cookie is not accepted
const LOGIN_REQUIRED: i64 = -3000;

static P_SKEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p_skey=([^;]*)").expect("valid p_skey pattern"));
static JSONP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)_preloadCallback\((.*)\)\s*;?\s*$").expect("valid jsonp pattern")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag pattern"));

#[derive(Debug, Deserialize)]
struct MsgListResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    msglist: Option<Vec<Message>>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
    #[serde(default, rename = "createTime")]
    create_time: String,
    #[serde(default)]
    created_time: Option<i64>,
}

/// Qzone's CSRF token: a djb2-style hash of the `p_skey` cookie value.
pub fn g_tk(p_skey: &str) -> u32 {
    let mut t: i64 = 5381;
    for c in p_skey.chars() {
        // reducing mod 2^31 each step matches masking once at the end
        t = (t + (t << 5) + i64::from(u32::from(c))) & 0x7fff_ffff;
    }
    u32::try_from(t).unwrap_or_default()
}

/// Extract `p_skey` from a cookie header value.
pub fn p_skey(cookie: &str) -> Option<&str> {
    P_SKEY
        .captures(cookie)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
}

/// Remove markup and non-breaking space entities from message content.
pub fn strip_html(content: &str) -> String {
    HTML_TAG.replace_all(content, "").replace("&nbsp;", " ")
}

/// Offset of the first post on `page`, or `None` past the addressable range.
fn page_offset(page: u32) -> Option<u32> {
    page.checked_mul(PAGE_SIZE)
}

fn unwrap_jsonp(body: &str) -> Option<&str> {
    JSONP
        .captures(body.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Outcome of parsing one msglist page; `None` marks the end of the board.
fn parse_page(platform: &str, body: &str) -> Result<Option<Vec<Post>>, FetchError> {
    let json = unwrap_jsonp(body)
        .ok_or_else(|| FetchError::Transient("response is not a msglist callback".to_string()))?;
    let response: MsgListResponse = serde_json::from_str(json)
        .map_err(|e| FetchError::Transient(format!("unparsable msglist: {e}")))?;

    match response.code {
        0 => {}
        LOGIN_REQUIRED => {
            return Err(FetchError::Fatal(format!("login required: {}", response.message)))
        }
        code => {
            return Err(FetchError::Transient(format!(
                "msglist code {code}: {}",
                response.message
            )))
        }
    }

    let messages = match response.msglist {
        Some(list) if !list.is_empty() => list,
        _ => return Ok(None),
    };

    Ok(Some(
        messages
            .into_iter()
            .map(|msg| {
                let time = if msg.create_time.is_empty() {
                    msg.created_time.map(|t| t.to_string()).unwrap_or_default()
                } else {
                    msg.create_time
                };
                Post::new(platform, time, strip_html(&msg.content))
            })
            .collect(),
    ))
}

/// Fetches a user's Qzone messages, 20 per page.
pub struct QzoneClient {
    name: String,
    base_url: String,
    pages: u32,
    g_tk: Option<u32>,
    transport: HttpTransport,
}

impl QzoneClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let cookie = config
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("cookie"))
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();
        let g_tk = p_skey(cookie).map(g_tk);
        if g_tk.is_none() {
            warn!(platform = %config.name, "cookie has no p_skey; fetches will fail");
        }

        Ok(Self {
            name: config.name.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            pages: config.pages.max(1),
            g_tk,
            transport: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl PlatformClient for QzoneClient {
    fn platform(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, external_id: &str) -> Result<Vec<Post>, FetchError> {
        let g_tk = self
            .g_tk
            .ok_or_else(|| FetchError::Fatal("login required: cookie has no p_skey".to_string()))?;
        let url = format!("{}{MSGLIST_PATH}", self.base_url.trim_end_matches('/'));

        let mut posts = Vec::new();
        for page in 0..self.pages {
            let Some(pos) = page_offset(page) else {
                break;
            };
            let query = [
                ("uin", external_id.to_string()),
                ("ftype", "0".to_string()),
                ("sort", "0".to_string()),
                ("pos", pos.to_string()),
                ("num", PAGE_SIZE.to_string()),
                ("replynum", "100".to_string()),
                ("g_tk", g_tk.to_string()),
                ("callback", CALLBACK.to_string()),
                ("code_version", "1".to_string()),
                ("format", "jsonp".to_string()),
                ("need_private_comment", "1".to_string()),
            ];
            let body = self.transport.get_text(&url, &query).await?;
            match parse_page(&self.name, &body)? {
                Some(batch) => {
                    debug!(uin = external_id, page, count = batch.len(), "qzone page fetched");
                    posts.extend(batch);
                }
                None => break,
            }
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_stops_at_overflow() {
        assert_eq!(page_offset(0), Some(0));
        assert_eq!(page_offset(3), Some(60));
        assert_eq!(page_offset(u32::MAX / PAGE_SIZE), Some(u32::MAX / PAGE_SIZE * PAGE_SIZE));
        assert_eq!(page_offset(u32::MAX / PAGE_SIZE + 1), None);
    }

    #[test]
    fn test_g_tk_known_values() {
        assert_eq!(g_tk(""), 5381);
        // 5381 + (5381 << 5) + 'a'
        assert_eq!(g_tk("a"), 177_670);
    }

    #[test]
    fn test_g_tk_stays_within_31_bits() {
        let long = "x".repeat(64);
        assert!(g_tk(&long) <= 0x7fff_ffff);
    }

    #[test]
    fn test_p_skey_extraction() {
        assert_eq!(p_skey("uin=o1; p_skey=abc*DEF; skey=1"), Some("abc*DEF"));
        assert_eq!(p_skey("uin=o1; p_skey=tail"), Some("tail"));
        assert_eq!(p_skey("uin=o1; skey=1"), None);
        assert_eq!(p_skey("p_skey=;"), None);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<b>hi</b>&nbsp;there <img src=\"x\"/>"),
            "hi there "
        );
    }

    #[test]
    fn test_parse_page() {
        let body = r#"_preloadCallback({"code":0,"message":"","msglist":[
            {"content":"good <b>day</b>","createTime":"2024年10月15日"},
            {"content":"second","createTime":"","created_time":1700000000}
        ]});"#;
        let posts = parse_page("qzone", body).unwrap().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "good day");
        assert!(posts[0].timestamp.is_parsed());
        assert_eq!(posts[1].timestamp.raw, "1700000000");
    }

    #[test]
    fn test_parse_page_end_of_board() {
        let body = r#"_preloadCallback({"code":0,"msglist":null});"#;
        assert_eq!(parse_page("qzone", body).unwrap(), None);
    }

    #[test]
    fn test_parse_page_error_codes() {
        let login = r#"_preloadCallback({"code":-3000,"message":"please login"});"#;
        assert!(matches!(parse_page("qzone", login), Err(FetchError::Fatal(_))));

        let busy = r#"_preloadCallback({"code":-10000,"message":"busy"});"#;
        assert!(parse_page("qzone", busy).unwrap_err().is_transient());

        assert!(parse_page("qzone", "not jsonp").unwrap_err().is_transient());
    }
}
