//! Core types for Notescout

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::LogicalField;
use crate::note_url::PostUrl;

/// What is known about an author at some point during resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub handle: Option<String>,
    pub display_name: String,
    pub internal_id: Option<String>,
}

impl Identity {
    /// A target built from caller-supplied hints; empty strings become absent
    pub fn from_hints(handle: &str, display_name: &str) -> Self {
        Self {
            handle: non_empty(handle),
            display_name: display_name.trim().to_string(),
            internal_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.internal_id.is_some()
    }

    pub fn handle_str(&self) -> &str {
        self.handle.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = if self.display_name.is_empty() {
            "<unnamed>"
        } else {
            &self.display_name
        };
        write!(f, "{}", name)?;
        if let Some(handle) = &self.handle {
            write!(f, " @{}", handle)?;
        }
        if let Some(id) = &self.internal_id {
            write!(f, " (id {})", id)?;
        }
        Ok(())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A raw user object from a search hit or a post's author fragment.
///
/// The same logical field can sit under different keys depending on the
/// endpoint, so nothing here is trusted until it has gone through the
/// matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserCandidate(Map<String, Value>);

impl UserCandidate {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// `None` unless `value` is a JSON object
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn id(&self) -> Option<String> {
        LogicalField::UserId.resolve(&self.0)
    }

    pub fn handle(&self) -> Option<String> {
        LogicalField::Handle.resolve(&self.0)
    }

    pub fn display_name(&self) -> Option<String> {
        LogicalField::DisplayName.resolve(&self.0)
    }

    pub fn to_identity(&self) -> Identity {
        Identity {
            handle: self.handle(),
            display_name: self.display_name().unwrap_or_default(),
            internal_id: self.id(),
        }
    }
}

/// A post as listed by profile enumeration or keyword search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub post_id: String,
    pub access_token: String,
    pub author: Option<UserCandidate>,
}

impl PostSummary {
    pub fn new(post_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            access_token: access_token.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: UserCandidate) -> Self {
        self.author = Some(author);
        self
    }

    /// Parse a listing or search entry.
    ///
    /// Returns `None` for entries that are not posts (`model_type` present
    /// and not `note`, e.g. suggested queries mixed into search results) and
    /// for entries with no post id. The author is taken from `user`, or from
    /// `note_card.user` when the endpoint nests it.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        if let Some(kind) = map.get("model_type").and_then(Value::as_str) {
            if kind != "note" {
                return None;
            }
        }

        let post_id = LogicalField::NoteId.resolve(map)?;
        let access_token = LogicalField::AccessToken.resolve(map).unwrap_or_default();
        let author = map
            .get("user")
            .or_else(|| map.get("note_card").and_then(|card| card.get("user")))
            .and_then(UserCandidate::from_value);

        Some(Self {
            post_id,
            access_token,
            author,
        })
    }
}

/// The detail object returned when fetching a single post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPost(Map<String, Value>);

/// Author keys that may appear flattened onto the post object itself
const FLATTENED_AUTHOR_KEYS: &[&str] = &["user_id", "userId", "nickname", "red_id", "redId"];

impl RawPost {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn post_id(&self) -> Option<String> {
        LogicalField::NoteId.resolve(&self.0)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// The author fragment: the nested `user` object if present, otherwise
    /// whatever author keys were flattened onto the post.
    ///
    /// The post's own `id` is never read as an author id.
    pub fn author(&self) -> Option<UserCandidate> {
        if let Some(user) = self.0.get("user").and_then(UserCandidate::from_value) {
            return Some(user);
        }

        let flattened: Map<String, Value> = FLATTENED_AUTHOR_KEYS
            .iter()
            .filter_map(|key| self.0.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();

        if flattened.is_empty() {
            None
        } else {
            Some(UserCandidate::new(flattened))
        }
    }
}

/// Which step of the discovery chain produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Enumerate the profile of a known user id
    DirectEnumeration,
    /// Find the user through user search, then enumerate their profile
    SearchThenEnumerate,
    /// Keyword post search filtered by author
    KeywordSearch,
    /// Unfiltered free-text post search
    QuerySearch,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::DirectEnumeration => write!(f, "direct-enumeration"),
            Strategy::SearchThenEnumerate => write!(f, "search-then-enumerate"),
            Strategy::KeywordSearch => write!(f, "keyword-search"),
            Strategy::QuerySearch => write!(f, "query-search"),
        }
    }
}

/// Outcome of one resolution call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Insertion order, no duplicate post ids
    pub posts: Vec<PostUrl>,
    pub resolved: bool,
    pub message: String,
    pub identity: Option<Identity>,
    pub strategy: Option<Strategy>,
}

impl DiscoveryResult {
    pub fn found(posts: Vec<PostUrl>, strategy: Strategy, identity: Option<Identity>) -> Self {
        Self {
            message: format!(
                "found {} post{} via {}",
                posts.len(),
                if posts.len() == 1 { "" } else { "s" },
                strategy
            ),
            posts,
            resolved: true,
            identity,
            strategy: Some(strategy),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            resolved: false,
            message: message.into(),
            identity: None,
            strategy: None,
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_from_hints_trims_and_drops_empty() {
        let identity = Identity::from_hints("  ", " GhostUser ");
        assert_eq!(identity.handle, None);
        assert_eq!(identity.display_name, "GhostUser");
        assert!(!identity.is_resolved());
    }

    #[test]
    fn test_identity_display() {
        let identity = Identity {
            handle: Some("sdydnz001".to_string()),
            display_name: "Sardine".to_string(),
            internal_id: Some("5f1a".to_string()),
        };
        assert_eq!(identity.to_string(), "Sardine @sdydnz001 (id 5f1a)");
        assert_eq!(Identity::default().to_string(), "<unnamed>");
    }

    #[test]
    fn test_candidate_to_identity_uses_synonyms() {
        let candidate =
            UserCandidate::from_value(&json!({"userId": "u9", "redId": "abc", "name": "Li"}))
                .unwrap();
        let identity = candidate.to_identity();
        assert_eq!(identity.internal_id.as_deref(), Some("u9"));
        assert_eq!(identity.handle.as_deref(), Some("abc"));
        assert_eq!(identity.display_name, "Li");
    }

    #[test]
    fn test_summary_from_profile_entry() {
        let summary =
            PostSummary::from_value(&json!({"note_id": "p1", "xsec_token": "t1"})).unwrap();
        assert_eq!(summary.post_id, "p1");
        assert_eq!(summary.access_token, "t1");
        assert!(summary.author.is_none());
    }

    #[test]
    fn test_summary_from_search_hit_with_nested_author() {
        let hit = json!({
            "id": "n42",
            "model_type": "note",
            "xsec_token": "tok",
            "note_card": {"user": {"user_id": "u1", "nickname": "Jane"}}
        });
        let summary = PostSummary::from_value(&hit).unwrap();
        assert_eq!(summary.post_id, "n42");
        let author = summary.author.unwrap();
        assert_eq!(author.id().as_deref(), Some("u1"));
        assert_eq!(author.display_name().as_deref(), Some("Jane"));
    }

    #[test]
    fn test_summary_skips_non_note_hits() {
        let hit = json!({"id": "q1", "model_type": "rec_query"});
        assert!(PostSummary::from_value(&hit).is_none());
    }

    #[test]
    fn test_summary_without_id_is_skipped() {
        assert!(PostSummary::from_value(&json!({"xsec_token": "t"})).is_none());
        assert!(PostSummary::from_value(&json!("p1")).is_none());
    }

    #[test]
    fn test_raw_post_author_nested() {
        let post =
            RawPost::from_value(&json!({"note_id": "abc", "user": {"id": "u1", "name": "Jane"}}))
                .unwrap();
        let author = post.author().unwrap();
        assert_eq!(author.id().as_deref(), Some("u1"));
        assert_eq!(post.post_id().as_deref(), Some("abc"));
    }

    #[test]
    fn test_raw_post_author_flattened_ignores_post_id() {
        let post = RawPost::from_value(&json!({
            "id": "note-id",
            "title": "hello",
            "user_id": "u7",
            "nickname": "Seven"
        }))
        .unwrap();
        let author = post.author().unwrap();
        assert_eq!(author.id().as_deref(), Some("u7"));
        assert_eq!(author.display_name().as_deref(), Some("Seven"));
        assert_eq!(post.title(), Some("hello"));

        let anonymous = RawPost::from_value(&json!({"id": "note-id"})).unwrap();
        assert!(anonymous.author().is_none());
    }

    #[test]
    fn test_strategy_serializes_snake_case() {
        let json = serde_json::to_string(&Strategy::SearchThenEnumerate).unwrap();
        assert_eq!(json, r#""search_then_enumerate""#);
        assert_eq!(Strategy::KeywordSearch.to_string(), "keyword-search");
    }

    #[test]
    fn test_found_message_pluralization() {
        let one = vec![PostUrl::from_parts("p1", "t1").unwrap()];
        let result = DiscoveryResult::found(one, Strategy::DirectEnumeration, None);
        assert_eq!(result.message, "found 1 post via direct-enumeration");

        let two = vec![
            PostUrl::from_parts("p1", "t1").unwrap(),
            PostUrl::from_parts("p2", "t2").unwrap(),
        ];
        let result = DiscoveryResult::found(two, Strategy::QuerySearch, None);
        assert_eq!(result.message, "found 2 posts via query-search");
    }

    #[test]
    fn test_failed_result() {
        let result = DiscoveryResult::failed("no posts found");
        assert!(!result.resolved);
        assert!(result.posts.is_empty());
        assert_eq!(result.message, "no posts found");
    }
}
