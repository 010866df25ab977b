//! Posts fetched from a platform and their sentiment annotation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp as delivered by the platform plus its parsed form, when parsing worked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTimestamp {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<DateTime<FixedOffset>>,
}

const WEIBO_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const CJK_DATE_FORMAT: &str = "%Y年%m月%d日";
const CJK_DATETIME_FORMAT: &str = "%Y年%m月%d日 %H:%M";

impl PostTimestamp {
    /// Parse a raw platform timestamp.
    ///
    /// Accepted shapes, in order: RFC 3339, Weibo's `Tue Oct 15 12:00:00 +0800 2024`,
    /// Qzone's `2024年10月15日` (optionally with ` HH:MM`), and unix seconds.
    /// Naive forms are taken as UTC. Anything else keeps only the raw text.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_timestamp(raw.trim());
        Self { raw, parsed }
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.is_some()
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, WEIBO_FORMAT) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, CJK_DATETIME_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, CJK_DATE_FORMAT) {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = value.parse().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset());
    }
    None
}

/// The ten emotion categories the classifier distinguishes, from most
/// negative to most positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    /// Despair, shame
    Despair,
    /// Sadness, pain
    Sadness,
    /// Fear, anxiety
    Fear,
    /// Anger, dissatisfaction
    Anger,
    /// Wariness, impatience
    Wariness,
    /// Boredom, indifference
    Boredom,
    /// Calm, composure
    Calm,
    /// Optimism, approval
    Optimism,
    /// Determination, courage
    Determination,
    /// Happiness, joy
    Joy,
}

impl SentimentLabel {
    pub const ALL: [Self; 10] = [
        Self::Despair,
        Self::Sadness,
        Self::Fear,
        Self::Anger,
        Self::Wariness,
        Self::Boredom,
        Self::Calm,
        Self::Optimism,
        Self::Determination,
        Self::Joy,
    ];

    /// Score attached to the label: 0 for despair up to 90 for joy, step 10.
    pub fn score(self) -> u8 {
        let index = Self::ALL
            .iter()
            .position(|label| *label == self)
            .unwrap_or_default();
        // index < 10, so the product fits in u8
        u8::try_from(index * 10).unwrap_or(u8::MAX)
    }

    /// Label for a classifier output index, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Despair => "despair",
            Self::Sadness => "sadness",
            Self::Fear => "fear",
            Self::Anger => "anger",
            Self::Wariness => "wariness",
            Self::Boredom => "boredom",
            Self::Calm => "calm",
            Self::Optimism => "optimism",
            Self::Determination => "determination",
            Self::Joy => "joy",
        };
        f.write_str(name)
    }
}

/// Classifier verdict for one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub score: u8,
}

impl From<SentimentLabel> for Sentiment {
    fn from(label: SentimentLabel) -> Self {
        Self {
            label,
            score: label.score(),
        }
    }
}

/// One post fetched from a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub timestamp: PostTimestamp,
    pub text: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sentiment: Option<Sentiment>,
}

impl Post {
    pub fn new(platform: impl Into<String>, raw_time: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: PostTimestamp::parse(raw_time),
            text: text.into(),
            platform: platform.into(),
            sentiment: None,
        }
    }

    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}
