//! Rendering of discovery results for the CLI tools

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, ScoutError};
use crate::note_url::PostUrl;
use crate::types::{DiscoveryResult, Identity, Strategy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Verdict header, author line, one URL per line
    #[default]
    Text,
    /// Whole result as one pretty-printed document
    Json,
    /// One `{post_id, url}` object per line
    Jsonl,
    /// `post_id,access_token,url` with a header row
    Csv,
}

impl FromStr for OutputFormat {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ScoutError::InvalidInput(format!(
                "unknown output format '{}'. Valid formats: text, json, jsonl, csv",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
        };
        f.write_str(s)
    }
}

#[derive(Serialize)]
struct PostEntry<'a> {
    post_id: &'a str,
    access_token: &'a str,
    url: String,
}

#[derive(Serialize)]
struct LineEntry<'a> {
    post_id: &'a str,
    url: String,
}

#[derive(Serialize)]
struct Report<'a> {
    resolved: bool,
    message: &'a str,
    strategy: Option<Strategy>,
    identity: Option<&'a Identity>,
    count: usize,
    posts: Vec<PostEntry<'a>>,
    generated_at: String,
}

/// Render `result` in `format` with URLs made absolute against `web_base`.
/// The returned string carries no trailing newline.
pub fn render(result: &DiscoveryResult, format: OutputFormat, web_base: &str) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, web_base)),
        OutputFormat::Json => {
            let report = Report {
                resolved: result.resolved,
                message: &result.message,
                strategy: result.strategy,
                identity: result.identity.as_ref(),
                count: result.posts.len(),
                posts: result.posts.iter().map(|p| post_entry(p, web_base)).collect(),
                generated_at: chrono::Utc::now().to_rfc3339(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Jsonl => {
            let mut lines = Vec::with_capacity(result.posts.len());
            for post in &result.posts {
                let entry = LineEntry {
                    post_id: &post.post_id,
                    url: post.to_url(web_base),
                };
                lines.push(serde_json::to_string(&entry)?);
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Csv => {
            let mut lines = vec!["post_id,access_token,url".to_string()];
            for post in &result.posts {
                lines.push(format!(
                    "{},{},{}",
                    csv_field(&post.post_id),
                    csv_field(&post.access_token),
                    csv_field(&post.to_url(web_base))
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

fn render_text(result: &DiscoveryResult, web_base: &str) -> String {
    let mut lines = Vec::with_capacity(result.posts.len() + 2);
    let verdict = if result.resolved { "✓" } else { "✗" };
    lines.push(format!("{} {}", verdict, result.message));

    if let Some(identity) = &result.identity {
        lines.push(format!("  author: {}", identity));
    }
    lines.extend(result.posts.iter().map(|p| p.to_url(web_base)));
    lines.join("\n")
}

fn post_entry<'a>(post: &'a PostUrl, web_base: &str) -> PostEntry<'a> {
    PostEntry {
        post_id: &post.post_id,
        access_token: &post.access_token,
        url: post.to_url(web_base),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
