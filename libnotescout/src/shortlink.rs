//! Share short-link expansion
//!
//! The mobile app shares posts as `http://xhslink.com/...` links that
//! redirect to the full post URL. The normalizer only understands the full
//! form, so CLI inputs are expanded first.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::error::{CollaboratorError, Result};

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SHORT_LINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether `url` points at one of the short-link `hosts`
pub fn is_short_link(url: &str, hosts: &[String]) -> bool {
    let candidate = url.trim();
    let parsed = if candidate.contains("://") {
        url::Url::parse(candidate)
    } else {
        url::Url::parse(&format!("https://{}", candidate))
    };

    match parsed.ok().as_ref().and_then(|u| u.host_str()) {
        Some(host) => hosts.iter().any(|h| {
            let h = h.trim().to_ascii_lowercase();
            !h.is_empty() && (host == h || host.ends_with(&format!(".{}", h)))
        }),
        None => false,
    }
}

/// HTTP client that looks like a browser and follows redirects
pub fn short_link_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(SHORT_LINK_TIMEOUT)
        .build()
        .map_err(CollaboratorError::from)?;
    Ok(client)
}

/// Follow redirects from `url` and return where they end.
///
/// Any failure is logged and the input is returned unchanged.
pub async fn resolve_short_url(client: &reqwest::Client, url: &str) -> String {
    match client.get(url).send().await {
        Ok(resp) => {
            let final_url = resp.url().to_string();
            tracing::info!(short = url, resolved = %final_url, "Expanded short link");
            final_url
        }
        Err(e) => {
            tracing::warn!(url, "Failed to expand short link: {}", e);
            url.to_string()
        }
    }
}
