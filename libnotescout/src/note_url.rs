//! Post URL normalization
//!
//! Post links come in two shapes:
//!
//! - canonical: `https://www.xiaohongshu.com/explore/{id}?xsec_token={token}`
//! - share links: `https://www.xiaohongshu.com/discovery/item/{id}?source=webshare&xsec_token={token}&...`
//!
//! Both normalize to a [`PostUrl`], which renders as
//! `explore/{id}?xsec_token={token}` relative to the configured web base.
//!
//! ```
//! use libnotescout::note_url::normalize;
//!
//! let url = normalize("https://www.xiaohongshu.com/discovery/item/68ee19d3?xsec_token=AB-8=&xsec_source=pc_share").unwrap();
//! assert_eq!(url.canonical(), "explore/68ee19d3?xsec_token=AB-8=");
//! ```

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScoutError};
use crate::types::PostSummary;

const TOKEN_KEY: &str = "xsec_token";

/// A fetchable post address.
///
/// Equality and hashing consider only `post_id`: the token is an access
/// credential and may differ between two listings of the same post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostUrl {
    pub post_id: String,
    pub access_token: String,
}

impl PostUrl {
    /// Build from already-extracted parts; fails on an empty post id
    pub fn from_parts(post_id: &str, access_token: &str) -> Result<Self> {
        let post_id = post_id.trim();
        if post_id.is_empty() {
            return Err(ScoutError::MalformedInput(
                "post id is empty".to_string(),
            ));
        }
        Ok(Self {
            post_id: post_id.to_string(),
            access_token: access_token.trim().to_string(),
        })
    }

    pub fn from_summary(summary: &PostSummary) -> Result<Self> {
        Self::from_parts(&summary.post_id, &summary.access_token)
    }

    /// `explore/{post_id}?xsec_token={access_token}`
    pub fn canonical(&self) -> String {
        format!("explore/{}?{}={}", self.post_id, TOKEN_KEY, self.access_token)
    }

    /// Absolute URL under `web_base`
    pub fn to_url(&self, web_base: &str) -> String {
        format!("{}/{}", web_base.trim_end_matches('/'), self.canonical())
    }
}

impl PartialEq for PostUrl {
    fn eq(&self, other: &Self) -> bool {
        self.post_id == other.post_id
    }
}

impl Eq for PostUrl {}

impl Hash for PostUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.post_id.hash(state);
    }
}

impl std::fmt::Display for PostUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Normalize a canonical or share-style post link.
///
/// A missing token yields an empty-token `PostUrl`; only a missing post id
/// is an error.
pub fn normalize(raw: &str) -> Result<PostUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScoutError::MalformedInput("empty post link".to_string()));
    }

    let parsed = parse_loose(raw)?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let post_id = segment_after(&segments, &["explore"])
        .or_else(|| segment_after(&segments, &["discovery", "item"]))
        .ok_or_else(|| ScoutError::MalformedInput(format!("no post id in '{}'", raw)))?;

    let token = parsed
        .query()
        .and_then(|q| query_param(q, TOKEN_KEY))
        .unwrap_or_default();

    PostUrl::from_parts(post_id, token)
}

/// Accept absolute URLs, scheme-less host URLs and site-relative paths
fn parse_loose(raw: &str) -> Result<Url> {
    let malformed = |e: url::ParseError| ScoutError::MalformedInput(format!("'{}': {}", raw, e));

    match Url::parse(raw) {
        Ok(url) if url.has_host() => Ok(url),
        Ok(_) => Err(ScoutError::MalformedInput(format!(
            "'{}' is not a web link",
            raw
        ))),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if raw.starts_with('/') || raw.starts_with("explore/") || raw.starts_with("discovery/")
            {
                let base = Url::parse("https://localhost/").map_err(malformed)?;
                base.join(raw).map_err(malformed)
            } else {
                Url::parse(&format!("https://{}", raw)).map_err(malformed)
            }
        }
        Err(e) => Err(malformed(e)),
    }
}

/// The segment immediately following `prefix` in `segments`
fn segment_after<'a>(segments: &[&'a str], prefix: &[&str]) -> Option<&'a str> {
    segments
        .windows(prefix.len() + 1)
        .find(|window| window[..prefix.len()] == *prefix)
        .map(|window| window[prefix.len()])
}

/// Literal key match on the raw query; the value is returned undecoded
fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
