use crate::domain::models::Sentiment;

/// Sentiment classifier for post text.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Sentiment;
}
