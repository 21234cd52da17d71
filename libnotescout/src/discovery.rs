//! Discovery strategy chain
//!
//! Three strategies run in priority order until one leaves the accumulator
//! non-empty:
//!
//! 1. **Direct enumeration**: list the profile of a known internal id.
//! 2. **Search then enumerate**: find the user through user search, accept
//!    a candidate through the matcher, then enumerate that profile.
//! 3. **Keyword search**: search posts by display name, then by handle,
//!    keeping hits whose author passes the matcher.
//!
//! A platform failure inside a strategy only means that strategy
//! contributed nothing; the chain logs it and moves on. An empty final
//! result is a valid outcome, not an error.

use crate::accumulator::NoteAccumulator;
use crate::config::Config;
use crate::matcher::CandidateMatcher;
use crate::note_url::PostUrl;
use crate::platforms::{FilterSet, NoteSource};
use crate::types::{Identity, PostSummary, Strategy};

/// What one strategy attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Added this many new posts
    Found(usize),
    /// Ran without errors but added nothing
    Empty,
    /// A platform call failed; the message is the cause
    Failed(String),
    /// Inputs for the strategy were missing
    Skipped,
}

/// Result of running the whole chain
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub posts: Vec<PostUrl>,
    /// The strategy that produced `posts`, if any
    pub strategy: Option<Strategy>,
    /// The target, with `internal_id` filled in when a strategy confirmed one
    pub identity: Identity,
    /// Platform failure messages, in the order they happened
    pub failures: Vec<String>,
}

impl ChainReport {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Runs the strategies against one source with one matching policy
pub struct DiscoveryChain<'a> {
    source: &'a dyn NoteSource,
    matcher: &'a dyn CandidateMatcher,
    config: &'a Config,
}

impl<'a> DiscoveryChain<'a> {
    pub fn new(
        source: &'a dyn NoteSource,
        matcher: &'a dyn CandidateMatcher,
        config: &'a Config,
    ) -> Self {
        Self {
            source,
            matcher,
            config,
        }
    }

    /// Run S1 → S2 → S3, stopping at the first strategy that finds posts.
    ///
    /// S1 runs only when `target.internal_id` is known; S2 only when a handle
    /// or display name is present.
    pub async fn run(&self, target: Identity) -> ChainReport {
        let mut acc = NoteAccumulator::new();
        let mut identity = target;
        let mut failures = Vec::new();

        let mut enumerated: Option<String> = None;
        if let Some(id) = identity.internal_id.clone() {
            let outcome = self.direct_enumeration(&id, &mut acc).await;
            record_failure(&outcome, &mut failures);
            enumerated = Some(id);
            if !acc.is_empty() {
                return finish(acc, Strategy::DirectEnumeration, identity, failures);
            }
        }

        let outcome = self
            .search_then_enumerate(&mut identity, enumerated.as_deref(), &mut acc)
            .await;
        record_failure(&outcome, &mut failures);
        if !acc.is_empty() {
            return finish(acc, Strategy::SearchThenEnumerate, identity, failures);
        }

        let outcome = self.keyword_search(&identity, &mut acc).await;
        record_failure(&outcome, &mut failures);
        if !acc.is_empty() {
            return finish(acc, Strategy::KeywordSearch, identity, failures);
        }

        tracing::info!(author = %identity, "All discovery strategies came up empty");
        ChainReport {
            posts: Vec::new(),
            strategy: None,
            identity,
            failures,
        }
    }

    /// S1: enumerate the profile of `internal_id` once
    pub async fn direct_enumeration(
        &self,
        internal_id: &str,
        acc: &mut NoteAccumulator,
    ) -> StrategyOutcome {
        let profile_url = self.config.profile_url(internal_id);
        tracing::info!(%profile_url, "Enumerating profile");

        match self.source.fetch_all_posts(&profile_url).await {
            Ok(summaries) => {
                tracing::info!(%profile_url, count = summaries.len(), "Profile listing received");
                let added = accumulate(summaries.iter(), acc);
                outcome_for(added)
            }
            Err(e) => {
                tracing::warn!(%profile_url, "Profile enumeration failed: {}", e);
                StrategyOutcome::Failed(format!("profile enumeration failed: {}", e))
            }
        }
    }

    /// S2: user search, matcher, then S1 on the first accepted candidate that
    /// carries an id.
    ///
    /// When `target.internal_id` is already known only a candidate with that
    /// same id is accepted; otherwise it is set to the accepted candidate's
    /// id. `already_enumerated` suppresses a second listing of a profile S1
    /// already tried.
    pub async fn search_then_enumerate(
        &self,
        target: &mut Identity,
        already_enumerated: Option<&str>,
        acc: &mut NoteAccumulator,
    ) -> StrategyOutcome {
        let handle = target.handle_str().to_string();
        let name = target.display_name.clone();
        let query = if handle.is_empty() { &name } else { &handle };
        if query.is_empty() {
            return StrategyOutcome::Skipped;
        }

        tracing::info!(handle = %handle, name = %name, "Searching users");
        let candidates = match self.source.search_users(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(query = %query, "User search failed: {}", e);
                return StrategyOutcome::Failed(format!("user search failed: {}", e));
            }
        };

        // a post's own author id stays authoritative: candidates carrying a
        // different id are not the target, however well their names match
        let known_id = target.internal_id.clone();
        let mut accepted_without_id = false;
        let mut rejected_foreign = 0usize;
        let accepted = candidates
            .iter()
            .filter(|c| self.matcher.matches(c, &handle, &name))
            .find_map(|c| {
                let Some(id) = c.id() else {
                    accepted_without_id = true;
                    return None;
                };
                match known_id.as_deref() {
                    Some(known) if known != id => {
                        rejected_foreign += 1;
                        None
                    }
                    _ => Some((id, c)),
                }
            });

        let Some((user_id, candidate)) = accepted else {
            if rejected_foreign > 0 {
                tracing::warn!(
                    known_id = known_id.as_deref().unwrap_or_default(),
                    rejected = rejected_foreign,
                    "Matching users belong to a different account"
                );
            } else if accepted_without_id {
                tracing::warn!(handle = %handle, name = %name, "Matching user has no id field");
            } else {
                tracing::warn!(
                    handle = %handle,
                    name = %name,
                    candidates = candidates.len(),
                    "No user search candidate matched"
                );
            }
            return StrategyOutcome::Empty;
        };

        tracing::info!(
            user_id = %user_id,
            nickname = %candidate.display_name().unwrap_or_default(),
            "Matched user"
        );
        if target.internal_id.is_none() {
            target.internal_id = Some(user_id.clone());
        }

        if already_enumerated == Some(user_id.as_str()) {
            tracing::debug!(user_id = %user_id, "Profile already enumerated, skipping");
            return StrategyOutcome::Empty;
        }

        self.direct_enumeration(&user_id, acc).await
    }

    /// S3: keyword post search by display name then handle, filtered by author.
    ///
    /// Each query is an independent attempt; a failed query does not stop
    /// the next one. Stops after the first query that leaves `acc` non-empty.
    pub async fn keyword_search(
        &self,
        target: &Identity,
        acc: &mut NoteAccumulator,
    ) -> StrategyOutcome {
        let mut queries: Vec<&str> = Vec::new();
        for q in [target.display_name.as_str(), target.handle_str()] {
            if !q.is_empty() && !queries.contains(&q) {
                queries.push(q);
            }
        }
        if queries.is_empty() {
            return StrategyOutcome::Skipped;
        }

        let count = self.config.discovery.keyword_search_count;
        let filters = FilterSet::default();
        let before = acc.len();
        let mut last_error = None;

        for query in queries {
            tracing::info!(query, "Searching posts by keyword");
            let hits = match self.source.search_posts(query, count, &filters).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(query, "Post search failed: {}", e);
                    last_error = Some(format!("post search '{}' failed: {}", query, e));
                    continue;
                }
            };

            for hit in &hits {
                let Some(author) = hit.author.as_ref() else {
                    continue;
                };
                if self.matcher.accepts_author(author, target, acc.is_empty()) {
                    accumulate(std::iter::once(hit), acc);
                }
            }

            if !acc.is_empty() {
                tracing::info!(query, count = acc.len(), "Found posts through keyword search");
                break;
            }
        }

        match (acc.len() - before, last_error) {
            (0, Some(e)) => StrategyOutcome::Failed(e),
            (added, _) => outcome_for(added),
        }
    }
}

/// Normalize and add summaries, skipping malformed ones. Returns how many were new.
pub(crate) fn accumulate<'s>(
    summaries: impl Iterator<Item = &'s PostSummary>,
    acc: &mut NoteAccumulator,
) -> usize {
    let mut added = 0;
    for summary in summaries {
        match PostUrl::from_summary(summary) {
            Ok(url) => {
                if acc.add(url) {
                    added += 1;
                }
            }
            Err(e) => tracing::warn!("Skipping post: {}", e),
        }
    }
    added
}

fn outcome_for(added: usize) -> StrategyOutcome {
    if added > 0 {
        StrategyOutcome::Found(added)
    } else {
        StrategyOutcome::Empty
    }
}

fn record_failure(outcome: &StrategyOutcome, failures: &mut Vec<String>) {
    if let StrategyOutcome::Failed(msg) = outcome {
        failures.push(msg.clone());
    }
}

fn finish(
    acc: NoteAccumulator,
    strategy: Strategy,
    identity: Identity,
    failures: Vec<String>,
) -> ChainReport {
    tracing::info!(count = acc.len(), %strategy, "Discovery finished");
    ChainReport {
        posts: acc.into_items(),
        strategy: Some(strategy),
        identity,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::SubstringMatcher;
    use crate::platforms::mock::MockSource;
    use crate::types::UserCandidate;
    use serde_json::json;

    fn user(value: serde_json::Value) -> UserCandidate {
        UserCandidate::from_value(&value).unwrap()
    }

    fn hit(id: &str, author: serde_json::Value) -> PostSummary {
        PostSummary::new(id, format!("tok-{}", id)).with_author(user(author))
    }

    fn ids(posts: &[PostUrl]) -> Vec<&str> {
        posts.iter().map(|p| p.post_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_s1_short_circuits() {
        let source = MockSource::empty()
            .with_profile("u1", vec![PostSummary::new("p1", "t1")])
            .with_users(vec![user(json!({"user_id": "u2", "nickname": "Jane"}))]);
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let target = Identity {
            internal_id: Some("u1".to_string()),
            ..Identity::from_hints("", "Jane")
        };
        let report = chain.run(target).await;

        assert_eq!(ids(&report.posts), vec!["p1"]);
        assert_eq!(report.strategy, Some(Strategy::DirectEnumeration));
        assert_eq!(source.search_users_count(), 0);
        assert_eq!(source.search_posts_count(), 0);
    }

    #[tokio::test]
    async fn test_s2_skips_profile_already_enumerated() {
        let source = MockSource::empty()
            .with_users(vec![user(json!({"user_id": "u1", "nickname": "Jane"}))]);
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let target = Identity {
            internal_id: Some("u1".to_string()),
            ..Identity::from_hints("", "Jane")
        };
        let report = chain.run(target).await;

        assert!(report.is_empty());
        assert_eq!(source.fetch_all_posts_count(), 1);
        assert_eq!(source.search_users_count(), 1);
    }

    #[tokio::test]
    async fn test_s2_rejects_candidate_with_other_id() {
        let source = MockSource::empty()
            .with_users(vec![user(json!({"user_id": "u2", "nickname": "Jane Doe"}))])
            .with_profile("u2", vec![PostSummary::new("foreign", "t")]);
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut target = Identity {
            internal_id: Some("u1".to_string()),
            ..Identity::from_hints("", "Jane")
        };
        let mut acc = NoteAccumulator::new();
        let outcome = chain
            .search_then_enumerate(&mut target, None, &mut acc)
            .await;

        assert_eq!(outcome, StrategyOutcome::Empty);
        assert!(acc.is_empty());
        assert_eq!(target.internal_id.as_deref(), Some("u1"));
        assert_eq!(source.fetch_all_posts_count(), 0);
    }

    #[tokio::test]
    async fn test_s2_requires_candidate_with_id() {
        let source = MockSource::empty()
            .with_users(vec![
                user(json!({"red_id": "abc", "nickname": "No Id"})),
                user(json!({"userId": "u5", "redId": "abc"})),
            ])
            .with_profile("u5", vec![PostSummary::new("p5", "t5")]);
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let report = chain.run(Identity::from_hints("abc", "")).await;

        assert_eq!(ids(&report.posts), vec!["p5"]);
        assert_eq!(report.strategy, Some(Strategy::SearchThenEnumerate));
        assert_eq!(report.identity.internal_id.as_deref(), Some("u5"));
    }

    #[tokio::test]
    async fn test_s3_stops_after_first_productive_query() {
        let source = MockSource::empty()
            .with_search("Jane", vec![hit("p1", json!({"user_id": "u1", "nickname": "Jane"}))])
            .with_search("jane01", vec![hit("p2", json!({"user_id": "u1", "nickname": "Jane"}))]);
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        let outcome = chain
            .keyword_search(&Identity::from_hints("jane01", "Jane"), &mut acc)
            .await;

        assert_eq!(outcome, StrategyOutcome::Found(1));
        assert_eq!(source.post_queries(), vec!["Jane".to_string()]);
    }

    #[tokio::test]
    async fn test_s3_falls_through_to_handle_query() {
        let source = MockSource::empty()
            .with_search("Jane", vec![hit("x", json!({"user_id": "u9", "nickname": "Bob"}))])
            .with_search(
                "jane01",
                vec![hit("p2", json!({"user_id": "u1", "nickname": "jane01 studio"}))],
            );
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        chain
            .keyword_search(&Identity::from_hints("jane01", "Jane"), &mut acc)
            .await;

        assert_eq!(ids(acc.items()), vec!["p2"]);
        assert_eq!(source.post_queries(), vec!["Jane".to_string(), "jane01".to_string()]);
    }

    #[tokio::test]
    async fn test_s3_handle_fallback_only_while_empty() {
        // first hit passes only via the handle fallback; after that the
        // accumulator is non-empty so the second fallback-only hit is rejected
        let source = MockSource::empty().with_search(
            "Nobody",
            vec![
                hit("p1", json!({"user_id": "a", "nickname": "x", "red_id": "h77_alt"})),
                hit("p2", json!({"user_id": "b", "nickname": "y", "red_id": "h77_other"})),
                hit("p3", json!({"user_id": "c", "nickname": "Nobody here"})),
            ],
        );
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        chain
            .keyword_search(&Identity::from_hints("h77", "Nobody"), &mut acc)
            .await;

        assert_eq!(ids(acc.items()), vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_s3_resolved_id_accepts_renamed_author() {
        let source = MockSource::empty().with_search(
            "Old Name",
            vec![
                hit("p1", json!({"userId": "u1", "nickname": "New Name"})),
                hit("p2", json!({"userId": "u2", "nickname": "Stranger"})),
            ],
        );
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let target = Identity {
            internal_id: Some("u1".to_string()),
            ..Identity::from_hints("", "Old Name")
        };
        let mut acc = NoteAccumulator::new();
        chain.keyword_search(&target, &mut acc).await;

        assert_eq!(ids(acc.items()), vec!["p1"]);
    }

    #[tokio::test]
    async fn test_s3_failure_of_one_query_does_not_stop_next() {
        let source = MockSource::empty().failing_post_search("timeout");
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        let outcome = chain
            .keyword_search(&Identity::from_hints("h", "n"), &mut acc)
            .await;

        assert_eq!(source.search_posts_count(), 2);
        assert!(matches!(outcome, StrategyOutcome::Failed(msg) if msg.contains("timeout")));
    }

    #[tokio::test]
    async fn test_s3_skipped_without_queries() {
        let source = MockSource::empty();
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        let outcome = chain.keyword_search(&Identity::default(), &mut acc).await;

        assert_eq!(outcome, StrategyOutcome::Skipped);
        assert_eq!(source.search_posts_count(), 0);
    }

    #[tokio::test]
    async fn test_chain_collects_failures_and_completes_empty() {
        let source = MockSource::failing("gateway down");
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let target = Identity {
            internal_id: Some("u1".to_string()),
            ..Identity::from_hints("h", "n")
        };
        let report = chain.run(target).await;

        assert!(report.is_empty());
        assert_eq!(report.strategy, None);
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures.iter().all(|f| f.contains("gateway down")));
    }

    #[tokio::test]
    async fn test_malformed_summaries_are_skipped() {
        let source = MockSource::empty().with_profile(
            "u1",
            vec![PostSummary::new("", "t0"), PostSummary::new("p1", "t1")],
        );
        let config = Config::default();
        let chain = DiscoveryChain::new(&source, &SubstringMatcher, &config);

        let mut acc = NoteAccumulator::new();
        let outcome = chain.direct_enumeration("u1", &mut acc).await;

        assert_eq!(outcome, StrategyOutcome::Found(1));
        assert_eq!(ids(acc.items()), vec!["p1"]);
    }
}
