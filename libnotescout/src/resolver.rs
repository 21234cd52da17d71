//! Resolution entry points
//!
//! [`Resolver`] is what the CLI tools call. Every entry point returns a
//! [`DiscoveryResult`]; platform errors, malformed links and missing
//! identities all end up as `resolved = false` with a readable message.
//!
//! ```no_run
//! use std::sync::Arc;
//! use libnotescout::platforms::gateway::GatewayClient;
//! use libnotescout::{Config, Resolver};
//!
//! # async fn example() -> libnotescout::Result<()> {
//! let config = Config::default();
//! let source = Arc::new(GatewayClient::new(&config.gateway)?);
//! let resolver = Resolver::new(source, config);
//!
//! let result = resolver.resolve_from_identity("959415797", "Pan Baixue").await;
//! if result.resolved {
//!     for post in &result.posts {
//!         println!("{}", post);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::accumulator::NoteAccumulator;
use crate::config::Config;
use crate::discovery::{accumulate, ChainReport, DiscoveryChain};
use crate::error::ScoutError;
use crate::matcher::{CandidateMatcher, SubstringMatcher};
use crate::note_url::normalize;
use crate::platforms::{FilterSet, NoteSource};
use crate::types::{DiscoveryResult, Identity, Strategy};

pub const NO_POSTS_FOUND: &str = "no posts found";

pub struct Resolver {
    source: Arc<dyn NoteSource>,
    matcher: Box<dyn CandidateMatcher>,
    config: Config,
}

impl Resolver {
    /// Resolver with the default substring matching policy
    pub fn new(source: Arc<dyn NoteSource>, config: Config) -> Self {
        Self {
            source,
            matcher: Box::new(SubstringMatcher),
            config,
        }
    }

    /// Replace the matching policy
    pub fn with_matcher(mut self, matcher: impl CandidateMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn chain(&self) -> DiscoveryChain<'_> {
        DiscoveryChain::new(self.source.as_ref(), self.matcher.as_ref(), &self.config)
    }

    /// Resolve the author of one post and list all of their posts.
    ///
    /// The post's author id drives direct enumeration first; if that yields
    /// nothing the author's handle and name feed the search strategies.
    pub async fn resolve_from_post_link(&self, url: &str) -> DiscoveryResult {
        let post_url = match normalize(url) {
            Ok(post_url) => post_url,
            Err(e) => {
                tracing::warn!(url, "Cannot use post link: {}", e);
                return DiscoveryResult::failed(e.to_string());
            }
        };

        let fetch_url = post_url.to_url(&self.config.platform.web_base);
        tracing::info!(url = %fetch_url, "Extracting author from post");

        let post = match self.source.fetch_post(&fetch_url).await {
            Ok(post) => post,
            Err(e) => {
                tracing::error!(url = %fetch_url, "Failed to fetch post: {}", e);
                return DiscoveryResult::failed(format!("failed to fetch post: {}", e));
            }
        };

        let author: Identity = post
            .author()
            .map(|fragment| fragment.to_identity())
            .unwrap_or_default();

        if author.internal_id.is_none() {
            let keys: Vec<&String> = post.fields().keys().collect();
            tracing::error!(post_id = %post_url.post_id, ?keys, "Post carries no author id");
            let err = ScoutError::IdentityNotFound(format!(
                "post {} has no author id",
                post_url.post_id
            ));
            return DiscoveryResult::failed(err.to_string()).with_identity(author);
        }

        tracing::info!(author = %author, "Found post author");
        let report = self.chain().run(author).await;
        into_result(report)
    }

    /// Resolve an author from a handle and/or display name
    pub async fn resolve_from_identity(&self, handle: &str, name: &str) -> DiscoveryResult {
        let target = Identity::from_hints(handle, name);
        if target.handle.is_none() && target.display_name.is_empty() {
            let err = ScoutError::InvalidInput("a handle or a display name is required".to_string());
            return DiscoveryResult::failed(err.to_string());
        }

        tracing::info!(author = %target, "Resolving author from identity hints");
        let report = self.chain().run(target).await;
        into_result(report)
    }

    /// Unfiltered keyword search, truncated to `max_count` posts
    pub async fn resolve_from_query(&self, query: &str, max_count: usize) -> DiscoveryResult {
        self.resolve_from_query_with(query, max_count, &FilterSet::default())
            .await
    }

    pub async fn resolve_from_query_with(
        &self,
        query: &str,
        max_count: usize,
        filters: &FilterSet,
    ) -> DiscoveryResult {
        let query = query.trim();
        if query.is_empty() {
            return DiscoveryResult::failed(
                ScoutError::InvalidInput("search query is empty".to_string()).to_string(),
            );
        }
        if max_count == 0 {
            return DiscoveryResult::failed(
                ScoutError::InvalidInput("max count must be at least 1".to_string()).to_string(),
            );
        }
        if let Err(e) = filters.validate() {
            return DiscoveryResult::failed(e.to_string());
        }

        let hits = match self.source.search_posts(query, max_count, filters).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!(query, "Post search failed: {}", e);
                return DiscoveryResult::failed(format!("post search failed: {}", e));
            }
        };

        let mut acc = NoteAccumulator::new();
        accumulate(hits.iter(), &mut acc);
        let mut posts = acc.into_items();
        posts.truncate(max_count);

        tracing::info!(query, count = posts.len(), "Keyword search finished");
        if posts.is_empty() {
            DiscoveryResult::failed(NO_POSTS_FOUND)
        } else {
            DiscoveryResult::found(posts, Strategy::QuerySearch, None)
        }
    }
}

fn into_result(report: ChainReport) -> DiscoveryResult {
    match report.strategy {
        Some(strategy) if !report.posts.is_empty() => {
            DiscoveryResult::found(report.posts, strategy, Some(report.identity))
        }
        _ => {
            let message = if report.failures.is_empty() {
                NO_POSTS_FOUND.to_string()
            } else {
                format!("{}; {}", NO_POSTS_FOUND, report.failures.join("; "))
            };
            DiscoveryResult::failed(message).with_identity(report.identity)
        }
    }
}
