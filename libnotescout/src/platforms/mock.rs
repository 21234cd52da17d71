//! Mock note source for testing
//!
//! This module provides a configurable in-memory [`NoteSource`] that can
//! simulate successes, failures and empty results for each of the four
//! platform calls, and records every call it receives. It's designed for
//! integration tests of the discovery chain without a gateway or network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{CollaboratorError, Result};
use crate::platforms::{FilterSet, NoteSource};
use crate::types::{PostSummary, RawPost, UserCandidate};

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    FetchPost(String),
    FetchAllPosts(String),
    SearchUsers(String),
    SearchPosts { query: String, count: usize },
}

/// Configuration for mock source behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Post returned by `fetch_post` for any URL
    pub post: Option<RawPost>,

    /// Error returned by `fetch_post`
    pub post_error: Option<String>,

    /// Profile listings keyed by internal user id (last profile URL segment)
    pub profiles: HashMap<String, Vec<PostSummary>>,

    /// Error returned by `fetch_all_posts`
    pub profile_error: Option<String>,

    /// Candidates returned by `search_users` for any query
    pub users: Vec<UserCandidate>,

    /// Error returned by `search_users`
    pub user_search_error: Option<String>,

    /// Post search hits keyed by exact query
    pub searches: HashMap<String, Vec<PostSummary>>,

    /// Error returned by `search_posts`
    pub post_search_error: Option<String>,

    /// Every call made (for verification)
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

/// Mock source for testing
pub struct MockSource {
    config: MockConfig,
}

impl MockSource {
    /// Create a new mock source with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A source where every call succeeds with nothing
    pub fn empty() -> Self {
        Self::new(MockConfig::default())
    }

    /// A source where every call fails with `error`
    pub fn failing(error: &str) -> Self {
        Self::new(MockConfig {
            post_error: Some(error.to_string()),
            profile_error: Some(error.to_string()),
            user_search_error: Some(error.to_string()),
            post_search_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub fn with_post(mut self, post: RawPost) -> Self {
        self.config.post = Some(post);
        self
    }

    pub fn with_profile(mut self, user_id: &str, posts: Vec<PostSummary>) -> Self {
        self.config.profiles.insert(user_id.to_string(), posts);
        self
    }

    pub fn with_users(mut self, users: Vec<UserCandidate>) -> Self {
        self.config.users = users;
        self
    }

    pub fn with_search(mut self, query: &str, hits: Vec<PostSummary>) -> Self {
        self.config.searches.insert(query.to_string(), hits);
        self
    }

    pub fn failing_post(mut self, error: &str) -> Self {
        self.config.post_error = Some(error.to_string());
        self
    }

    pub fn failing_profile(mut self, error: &str) -> Self {
        self.config.profile_error = Some(error.to_string());
        self
    }

    pub fn failing_user_search(mut self, error: &str) -> Self {
        self.config.user_search_error = Some(error.to_string());
        self
    }

    pub fn failing_post_search(mut self, error: &str) -> Self {
        self.config.post_search_error = Some(error.to_string());
        self
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.config.calls.lock().unwrap().clone()
    }

    pub fn fetch_all_posts_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::FetchAllPosts(_)))
    }

    pub fn search_users_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::SearchUsers(_)))
    }

    pub fn search_posts_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::SearchPosts { .. }))
    }

    /// Queries passed to `search_posts`, in order
    pub fn post_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::SearchPosts { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.config.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: MockCall) {
        self.config.calls.lock().unwrap().push(call);
    }
}

fn fail<T>(error: &Option<String>) -> Option<Result<T>> {
    error
        .as_ref()
        .map(|msg| Err(CollaboratorError::Rejected(msg.clone()).into()))
}

#[async_trait]
impl NoteSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_post(&self, url: &str) -> Result<RawPost> {
        self.record(MockCall::FetchPost(url.to_string()));

        if let Some(err) = fail(&self.config.post_error) {
            return err;
        }
        self.config
            .post
            .clone()
            .ok_or_else(|| CollaboratorError::Rejected(format!("post not found: {}", url)).into())
    }

    async fn fetch_all_posts(&self, profile_url: &str) -> Result<Vec<PostSummary>> {
        self.record(MockCall::FetchAllPosts(profile_url.to_string()));

        if let Some(err) = fail(&self.config.profile_error) {
            return err;
        }
        let user_id = profile_url.rsplit('/').next().unwrap_or_default();
        Ok(self.config.profiles.get(user_id).cloned().unwrap_or_default())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserCandidate>> {
        self.record(MockCall::SearchUsers(query.to_string()));

        if let Some(err) = fail(&self.config.user_search_error) {
            return err;
        }
        Ok(self.config.users.clone())
    }

    async fn search_posts(
        &self,
        query: &str,
        count: usize,
        _filters: &FilterSet,
    ) -> Result<Vec<PostSummary>> {
        self.record(MockCall::SearchPosts {
            query: query.to_string(),
            count,
        });

        if let Some(err) = fail(&self.config.post_search_error) {
            return err;
        }
        let mut hits = self.config.searches.get(query).cloned().unwrap_or_default();
        hits.truncate(count);
        Ok(hits)
    }
}
