//! Sentiment annotation for fetched posts.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::errors::FetchError;
use crate::domain::models::{Post, Sentiment, SentimentLabel};
use crate::domain::ports::{Classifier, PlatformClient};

/// Wraps a platform client and attaches a sentiment to every post it returns.
///
/// Failures pass through untouched, so the retry controller sees exactly
/// what the inner client reported.
pub struct ClassifyingClient<C> {
    inner: C,
    classifier: Arc<dyn Classifier>,
}

impl<C: PlatformClient> ClassifyingClient<C> {
    pub fn new(inner: C, classifier: Arc<dyn Classifier>) -> Self {
        Self { inner, classifier }
    }
}

#[async_trait]
impl<C: PlatformClient> PlatformClient for ClassifyingClient<C> {
    fn platform(&self) -> &str {
        self.inner.platform()
    }

    async fn fetch(&self, external_id: &str) -> Result<Vec<Post>, FetchError> {
        let posts = self.inner.fetch(external_id).await?;
        Ok(posts
            .into_iter()
            .map(|post| {
                let sentiment = self.classifier.classify(&post.text);
                post.with_sentiment(sentiment)
            })
            .collect())
    }
}

/// Lexicon classifier: the label whose keywords occur most often wins,
/// ties go to the earlier label in the lexicon, and text with no hits is calm.
pub struct KeywordClassifier {
    lexicon: Vec<(SentimentLabel, Vec<String>)>,
}

impl KeywordClassifier {
    pub fn new(lexicon: Vec<(SentimentLabel, Vec<String>)>) -> Self {
        Self { lexicon }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let entries: [(SentimentLabel, &[&str]); 10] = [
            (SentimentLabel::Despair, &["绝望", "羞耻", "崩溃"]),
            (SentimentLabel::Sadness, &["难过", "伤心", "痛苦", "哭"]),
            (SentimentLabel::Fear, &["害怕", "焦虑", "担心"]),
            (SentimentLabel::Anger, &["生气", "愤怒", "不满"]),
            (SentimentLabel::Wariness, &["警惕", "不耐烦", "烦"]),
            (SentimentLabel::Boredom, &["无聊", "无所谓"]),
            (SentimentLabel::Calm, &["平静", "淡定"]),
            (SentimentLabel::Optimism, &["乐观", "赞", "希望"]),
            (SentimentLabel::Determination, &["坚持", "加油", "努力"]),
            (SentimentLabel::Joy, &["开心", "快乐", "高兴", "哈哈"]),
        ];
        Self::new(
            entries
                .into_iter()
                .map(|(label, words)| (label, words.iter().map(|w| (*w).to_string()).collect()))
                .collect(),
        )
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Sentiment {
        let mut best: Option<(SentimentLabel, usize)> = None;
        for (label, words) in &self.lexicon {
            let hits: usize = words.iter().map(|w| text.matches(w.as_str()).count()).sum();
            if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
                best = Some((*label, hits));
            }
        }
        best.map_or(SentimentLabel::Calm, |(label, _)| label).into()
    }
}
