//! Field synonym resolution
//!
//! The platform reports the same logical attribute under different keys
//! depending on which endpoint produced the object (`user_id` from profile
//! pages, `userId` from search, `red_id` vs `redId`, ...). Every lookup of a
//! logical field goes through [`LogicalField::resolve`] so the accepted key
//! lists live in exactly one place.

use serde_json::{Map, Value};

/// A logical attribute that may appear under several literal keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalField {
    /// Platform-internal user id
    UserId,
    /// User-chosen public handle
    Handle,
    /// Display name
    DisplayName,
    /// Post id
    NoteId,
    /// Per-post access token
    AccessToken,
}

impl LogicalField {
    /// Accepted keys, in lookup order
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::UserId => &["user_id", "userId", "id"],
            Self::Handle => &["red_id", "redId"],
            Self::DisplayName => &["nickname", "name"],
            Self::NoteId => &["note_id", "noteId", "id"],
            Self::AccessToken => &["xsec_token", "xsecToken"],
        }
    }

    /// First present value among this field's keys.
    ///
    /// Empty strings, nulls and non-scalar values count as absent; numbers are
    /// rendered in decimal.
    pub fn resolve(&self, map: &Map<String, Value>) -> Option<String> {
        self.keys()
            .iter()
            .find_map(|key| map.get(*key).and_then(scalar_to_string))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_key_wins() {
        let m = map(json!({"userId": "camel", "user_id": "snake"}));
        assert_eq!(LogicalField::UserId.resolve(&m).as_deref(), Some("snake"));
    }

    #[test]
    fn test_falls_through_to_later_keys() {
        let m = map(json!({"redId": "xyz999"}));
        assert_eq!(LogicalField::Handle.resolve(&m).as_deref(), Some("xyz999"));

        let m = map(json!({"name": "Jane"}));
        assert_eq!(LogicalField::DisplayName.resolve(&m).as_deref(), Some("Jane"));
    }

    #[test]
    fn test_empty_and_null_are_absent() {
        let m = map(json!({"user_id": "", "userId": null, "id": "u1"}));
        assert_eq!(LogicalField::UserId.resolve(&m).as_deref(), Some("u1"));

        let m = map(json!({"nickname": ""}));
        assert_eq!(LogicalField::DisplayName.resolve(&m), None);
    }

    #[test]
    fn test_numbers_are_stringified() {
        let m = map(json!({"red_id": 959415797}));
        assert_eq!(LogicalField::Handle.resolve(&m).as_deref(), Some("959415797"));
    }

    #[test]
    fn test_missing_keys_do_not_panic() {
        let m = Map::new();
        for field in [
            LogicalField::UserId,
            LogicalField::Handle,
            LogicalField::DisplayName,
            LogicalField::NoteId,
            LogicalField::AccessToken,
        ] {
            assert_eq!(field.resolve(&m), None);
        }
    }

    #[test]
    fn test_nested_objects_are_not_values() {
        let m = map(json!({"id": {"inner": "x"}}));
        assert_eq!(LogicalField::NoteId.resolve(&m), None);
    }
}
