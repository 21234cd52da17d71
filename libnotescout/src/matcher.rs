//! Identity candidate matching
//!
//! Search endpoints rarely return an exact field match for the searched
//! term; the term usually shows up inside a longer display name. The
//! default policy is therefore a substring heuristic, which can produce
//! false positives when names collide. It sits behind [`CandidateMatcher`]
//! so a stricter policy can replace it without touching the discovery chain.

use crate::types::{Identity, UserCandidate};

/// Decides whether a raw user object refers to the target author
pub trait CandidateMatcher: Send + Sync {
    /// Accept a user-search candidate for `(target_handle, target_name)`
    fn matches(&self, candidate: &UserCandidate, target_handle: &str, target_name: &str) -> bool;

    /// Accept the author fragment of a keyword-search hit.
    ///
    /// `allow_handle_fallback` enables the weakest rule (handle substring of
    /// the author's handle); callers set it only while nothing has been
    /// accepted yet.
    fn accepts_author(
        &self,
        author: &UserCandidate,
        target: &Identity,
        allow_handle_fallback: bool,
    ) -> bool;
}

/// Exact handle first, then substring checks against the display name
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl CandidateMatcher for SubstringMatcher {
    fn matches(&self, candidate: &UserCandidate, target_handle: &str, target_name: &str) -> bool {
        let handle = candidate.handle().unwrap_or_default();
        let display_name = candidate.display_name().unwrap_or_default();

        if !target_handle.is_empty() && handle == target_handle {
            return true;
        }
        contains_non_empty(&display_name, target_handle)
            || contains_non_empty(&display_name, target_name)
    }

    fn accepts_author(
        &self,
        author: &UserCandidate,
        target: &Identity,
        allow_handle_fallback: bool,
    ) -> bool {
        if let (Some(resolved), Some(author_id)) = (target.internal_id.as_deref(), author.id()) {
            if author_id == resolved {
                return true;
            }
        }

        let display_name = author.display_name().unwrap_or_default();
        if contains_non_empty(&display_name, target.handle_str())
            || contains_non_empty(&display_name, &target.display_name)
        {
            return true;
        }

        allow_handle_fallback
            && contains_non_empty(&author.handle().unwrap_or_default(), target.handle_str())
    }
}

/// `needle` is non-empty and occurs in `haystack`
fn contains_non_empty(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.contains(needle)
}

/// [`SubstringMatcher::matches`] as a free function
pub fn matches(candidate: &UserCandidate, target_handle: &str, target_name: &str) -> bool {
    SubstringMatcher.matches(candidate, target_handle, target_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(value: serde_json::Value) -> UserCandidate {
        UserCandidate::from_value(&value).unwrap()
    }

    fn target(handle: &str, name: &str, id: Option<&str>) -> Identity {
        Identity {
            internal_id: id.map(str::to_string),
            ..Identity::from_hints(handle, name)
        }
    }

    #[test]
    fn test_exact_handle_is_reflexive() {
        let c = candidate(json!({"red_id": "abc"}));
        assert!(matches(&c, "abc", ""));
        assert!(matches(&c, "abc", "anything"));
        assert!(matches(&c, "abc", "someone else entirely"));
    }

    #[test]
    fn test_handle_under_synonym_key() {
        let c = candidate(json!({"redId": "xyz999", "nickname": "Unrelated"}));
        assert!(matches(&c, "xyz999", "Real Name"));
    }

    #[test]
    fn test_handle_substring_of_display_name() {
        let c = candidate(json!({"red_id": "other", "nickname": "shop_66669999y_official"}));
        assert!(matches(&c, "66669999y", ""));
    }

    #[test]
    fn test_name_substring_of_display_name() {
        let c = candidate(json!({"name": "DU_AN official"}));
        assert!(matches(&c, "", "DU_AN"));
    }

    #[test]
    fn test_rejects_when_nothing_appears() {
        let c = candidate(json!({"red_id": "zzz", "nickname": "Someone"}));
        assert!(!matches(&c, "abc", "Jane"));
    }

    #[test]
    fn test_empty_targets_never_match() {
        let c = candidate(json!({"red_id": "", "nickname": "Someone"}));
        assert!(!matches(&c, "", ""));

        let bare = candidate(json!({}));
        assert!(!matches(&bare, "", ""));
        assert!(!matches(&bare, "abc", "Jane"));
    }

    #[test]
    fn test_handle_is_not_substring_matched_against_handle() {
        // a partial handle match is only an S3 fallback, never a user-search match
        let c = candidate(json!({"red_id": "abc123", "nickname": "Someone"}));
        assert!(!matches(&c, "abc", ""));
    }

    #[test]
    fn test_author_accepted_by_resolved_id() {
        let author = candidate(json!({"userId": "u1", "nickname": "Renamed"}));
        assert!(SubstringMatcher.accepts_author(&author, &target("", "Jane", Some("u1")), false));
        assert!(!SubstringMatcher.accepts_author(&author, &target("", "Jane", Some("u2")), false));
    }

    #[test]
    fn test_author_accepted_by_name_substring() {
        let author = candidate(json!({"user_id": "u9", "nickname": "Jane's kitchen"}));
        assert!(SubstringMatcher.accepts_author(&author, &target("", "Jane", None), false));
    }

    #[test]
    fn test_author_handle_fallback_only_when_allowed() {
        let author = candidate(json!({"user_id": "u9", "nickname": "Someone", "red_id": "xyz999_2"}));
        let t = target("xyz999", "Nobody", None);
        assert!(!SubstringMatcher.accepts_author(&author, &t, false));
        assert!(SubstringMatcher.accepts_author(&author, &t, true));
    }

    #[test]
    fn test_author_without_fields_rejected() {
        let author = candidate(json!({}));
        assert!(!SubstringMatcher.accepts_author(&author, &target("h", "n", Some("u1")), true));
    }
}
