//! Platform boundary
//!
//! Everything that talks to the platform (sessions, request signing,
//! pagination) lives behind [`NoteSource`]. The discovery engine only ever
//! sees the four calls below and treats any error they return as "this
//! attempt contributed nothing".
//!
//! # Examples
//!
//! ```no_run
//! use libnotescout::platforms::{gateway::GatewayClient, NoteSource, FilterSet};
//! use libnotescout::config::GatewayConfig;
//!
//! # async fn example() -> libnotescout::error::Result<()> {
//! let client = GatewayClient::new(&GatewayConfig::default())?;
//!
//! let hits = client.search_posts("hiking", 20, &FilterSet::default()).await?;
//! for hit in hits {
//!     println!("{} ({})", hit.post_id, hit.access_token);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PostSummary, RawPost, UserCandidate};

pub mod filters;
pub mod gateway;

// Mock source is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use filters::{Distance, FilterSet, GeoPoint, NoteRange, NoteTime, NoteType, SortOrder};

/// Capability to read posts and users from the platform
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Short identifier used in logs (e.g. "gateway", "mock")
    fn name(&self) -> &str;

    /// Fetch the detail object of one post.
    ///
    /// `url` is an absolute post URL including its access token.
    async fn fetch_post(&self, url: &str) -> Result<RawPost>;

    /// Enumerate every post on a profile page.
    ///
    /// `profile_url` has the form `{web_base}/user/profile/{internal_id}`.
    async fn fetch_all_posts(&self, profile_url: &str) -> Result<Vec<PostSummary>>;

    /// Search users by keyword (first result page)
    async fn search_users(&self, query: &str) -> Result<Vec<UserCandidate>>;

    /// Search posts by keyword, returning at most `count` hits in the
    /// platform's native ranking
    async fn search_posts(
        &self,
        query: &str,
        count: usize,
        filters: &FilterSet,
    ) -> Result<Vec<PostSummary>>;
}
