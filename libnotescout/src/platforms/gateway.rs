//! HTTP client for the signing gateway
//!
//! The gateway is a local service that owns the platform session and signs
//! requests. It exposes the four [`NoteSource`] calls as GET endpoints and
//! wraps every payload in `{"success": bool, "msg": string, "data": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{CollaboratorError, Result};
use crate::platforms::{FilterSet, NoteSource};
use crate::types::{PostSummary, RawPost, UserCandidate};

const NOTE_PATH: &str = "/api/note";
const USER_NOTES_PATH: &str = "/api/user/notes";
const SEARCH_USERS_PATH: &str = "/api/search/users";
const SEARCH_NOTES_PATH: &str = "/api/search/notes";

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CollaboratorError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` and unwrap the envelope's `data`
    async fn get_data(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(CollaboratorError::from)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let body = resp.text().await.map_err(CollaboratorError::from)?;
        let envelope: Envelope = serde_json::from_str(&body).map_err(CollaboratorError::from)?;

        if !envelope.success {
            let msg = if envelope.msg.is_empty() {
                format!("{} returned success=false", path)
            } else {
                envelope.msg
            };
            return Err(CollaboratorError::Rejected(msg).into());
        }

        Ok(envelope.data)
    }
}

/// `data` as a list: either the value itself or the array under `key`.
/// A null payload is an empty list.
fn list_under<'a>(data: &'a Value, key: &str) -> Result<&'a [Value]> {
    match data {
        Value::Array(items) => Ok(items.as_slice()),
        Value::Null => Ok(&[][..]),
        Value::Object(map) => match map.get(key) {
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(Value::Null) | None => Ok(&[][..]),
            Some(_) => Err(CollaboratorError::Parse(format!("'{}' is not a list", key)).into()),
        },
        _ => Err(CollaboratorError::Parse("expected a list payload".to_string()).into()),
    }
}

fn summaries(items: &[Value]) -> Vec<PostSummary> {
    let parsed: Vec<PostSummary> = items.iter().filter_map(PostSummary::from_value).collect();
    let skipped = items.len() - parsed.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Dropped non-post or id-less entries");
    }
    parsed
}

#[async_trait]
impl NoteSource for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn fetch_post(&self, url: &str) -> Result<RawPost> {
        let data = self.get_data(NOTE_PATH, &[("url", url.to_string())]).await?;

        let note = match data.get("items") {
            Some(items) => items
                .as_array()
                .and_then(|items| items.first())
                .ok_or_else(|| CollaboratorError::Rejected(format!("post not found: {}", url)))?,
            None => &data,
        };

        RawPost::from_value(note)
            .ok_or_else(|| CollaboratorError::Parse("post payload is not an object".to_string()).into())
    }

    async fn fetch_all_posts(&self, profile_url: &str) -> Result<Vec<PostSummary>> {
        let data = self
            .get_data(USER_NOTES_PATH, &[("profile_url", profile_url.to_string())])
            .await?;
        let posts = summaries(list_under(&data, "notes")?);
        tracing::debug!(profile_url, count = posts.len(), "Enumerated profile");
        Ok(posts)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserCandidate>> {
        let data = self
            .get_data(
                SEARCH_USERS_PATH,
                &[("query", query.to_string()), ("page", "1".to_string())],
            )
            .await?;

        let users: Vec<UserCandidate> = list_under(&data, "users")?
            .iter()
            .filter_map(UserCandidate::from_value)
            .collect();

        if let Ok(preview) = serde_json::to_string(&users) {
            tracing::debug!(query, "User search results: {}", truncate(&preview, 500));
        }
        Ok(users)
    }

    async fn search_posts(
        &self,
        query: &str,
        count: usize,
        filters: &FilterSet,
    ) -> Result<Vec<PostSummary>> {
        filters.validate()?;

        let mut params = vec![("query", query.to_string()), ("count", count.to_string())];
        params.extend(filters.query_pairs());

        let data = self.get_data(SEARCH_NOTES_PATH, &params).await?;
        let mut posts = summaries(list_under(&data, "items")?);
        posts.truncate(count);
        Ok(posts)
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_under_shapes() {
        let array = json!([{"a": 1}, {"b": 2}]);
        assert_eq!(list_under(&array, "users").unwrap().len(), 2);

        let wrapped = json!({"users": [{"a": 1}]});
        assert_eq!(list_under(&wrapped, "users").unwrap().len(), 1);

        assert!(list_under(&Value::Null, "users").unwrap().is_empty());
        assert!(list_under(&json!({"other": []}), "users").unwrap().is_empty());

        assert!(list_under(&json!({"users": "nope"}), "users").is_err());
        assert!(list_under(&json!("text"), "users").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("李李呀_LiLi", 2), "李李");
        assert_eq!(truncate("short", 50), "short");
    }

    #[test]
    fn test_new_trims_base_url() {
        let client = GatewayClient::new(&GatewayConfig {
            base_url: "http://127.0.0.1:5005/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:5005");
        assert_eq!(client.name(), "gateway");
    }
}
