//! Platform client adapters
//!
//! HTTP clients for the supported platforms, the sentiment decorator, and
//! registry construction from configuration.

pub mod classifying;
pub mod http;
pub mod qzone;
pub mod weibo;

pub use classifying::{ClassifyingClient, KeywordClassifier};
pub use qzone::QzoneClient;
pub use weibo::WeiboClient;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::models::{Config, PlatformConfig, PlatformKind};
use crate::domain::ports::{Classifier, PlatformClient};
use crate::services::PlatformRegistry;

fn build_client(
    platform: &PlatformConfig,
    classifier: Option<&Arc<dyn Classifier>>,
) -> Result<Arc<dyn PlatformClient>> {
    let client: Arc<dyn PlatformClient> = match (platform.kind, classifier) {
        (PlatformKind::Weibo, None) => Arc::new(WeiboClient::new(platform)?),
        (PlatformKind::Weibo, Some(c)) => {
            Arc::new(ClassifyingClient::new(WeiboClient::new(platform)?, Arc::clone(c)))
        }
        (PlatformKind::Qzone, None) => Arc::new(QzoneClient::new(platform)?),
        (PlatformKind::Qzone, Some(c)) => {
            Arc::new(ClassifyingClient::new(QzoneClient::new(platform)?, Arc::clone(c)))
        }
    };
    Ok(client)
}

/// Build one client per configured platform.
pub fn build_registry(config: &Config) -> Result<PlatformRegistry> {
    let classifier: Option<Arc<dyn Classifier>> = config
        .run
        .classify
        .then(|| Arc::new(KeywordClassifier::default()) as Arc<dyn Classifier>);

    let mut registry = PlatformRegistry::new();
    for platform in &config.platforms {
        let client = build_client(platform, classifier.as_ref())
            .with_context(|| format!("Failed to set up client for {}", platform.name))?;
        registry.register(client);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_registry_from_defaults() {
        let mut config = Config::default();
        config.run.classify = true;
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("weibo").is_some());
        assert!(registry.get("qzone").is_some());
    }
}
