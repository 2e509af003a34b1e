//! Posting adapter boundary.

use vigil_error::VigilResult;

/// Identifier of a published post, as reported by the platform.
pub type PostId = String;

/// A platform the system can publish to (Bluesky-equivalent, etc.).
///
/// Invoked only as a scheduled action's payload, never directly by the
/// consent authority.
#[async_trait::async_trait]
pub trait PostingClient: Send + Sync {
    /// The adapter's platform name (e.g. "bsky").
    fn name(&self) -> &str;

    /// Publish a post, optionally with attached media references.
    async fn post(&self, text: &str, media: Option<&[String]>) -> VigilResult<PostId>;
}
