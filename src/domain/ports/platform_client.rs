use async_trait::async_trait;

use crate::domain::errors::FetchError;
use crate::domain::models::Post;

/// Fetches the posts of one external account on a single platform.
///
/// Implementations own their session state and are created once per run.
/// An empty `Ok` means the account has nothing to collect; it is not an error.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Platform name as used in roster `platformIds`
    fn platform(&self) -> &str;

    /// Fetch posts for `external_id`, bounded by the client's own timeout
    async fn fetch(&self, external_id: &str) -> Result<Vec<Post>, FetchError>;
}
