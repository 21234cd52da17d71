//! scout-author - List every post by one author

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use libnotescout::logging::{LogFormat, LoggingConfig};
use libnotescout::output::{render, OutputFormat};
use libnotescout::platforms::gateway::GatewayClient;
use libnotescout::{normalize, shortlink, Config, Resolver, ScoutError};

#[derive(Parser, Debug)]
#[command(name = "scout-author")]
#[command(version, about = "List every post by one author")]
#[command(long_about = r#"Resolve an author from a post link or from a handle and display name,
then list all of their posts as canonical links.

EXAMPLES:
    # From a post link (share links and xhslink.com short links work too)
    scout-author --link "https://www.xiaohongshu.com/explore/68ee19d3...?xsec_token=AB..."

    # From a handle (the red id shown on the profile) and display name
    scout-author --handle 959415797 --name "Pan Baixue"

    # Only a display name
    scout-author --name "Pan Baixue" --format jsonl

    # Unix composability
    scout-author --handle 959415797 --format csv | cut -d, -f3
    scout-author --name "Pan Baixue" --format json | jq -r '.posts[].url'

OUTPUT FORMATS:
    text  - Verdict line, author line, then one URL per line (default)
    json  - Full result document
    jsonl - One {post_id, url} object per line
    csv   - post_id,access_token,url with header

CONFIGURATION:
    --config PATH, else $NOTESCOUT_CONFIG, else ~/.config/notescout/config.toml

EXIT CODES:
    0 - Author resolved and posts listed
    1 - No posts found, or a runtime error
    2 - Usage error, or the gateway refused the session
    3 - Invalid input (malformed link, no identity given)
"#)]
struct Cli {
    /// Link to any post by the author
    #[arg(short, long, value_name = "URL")]
    #[arg(conflicts_with_all = ["handle", "name"])]
    link: Option<String>,

    /// Author handle (red id)
    #[arg(long, value_name = "HANDLE")]
    handle: Option<String>,

    /// Author display name
    #[arg(short, long, value_name = "NAME")]
    name: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json", "jsonl", "csv"])]
    format: String,

    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format for stderr (text, json, pretty)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.log_format, cli.verbose).init();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ScoutError>()
        .map(ScoutError::exit_code)
        .unwrap_or(1)
}

/// Returns whether the author was resolved
async fn run(cli: Cli) -> Result<bool> {
    let format: OutputFormat = cli.format.parse()?;
    let handle = cli.handle.as_deref().map(str::trim).unwrap_or_default();
    let name = cli.name.as_deref().map(str::trim).unwrap_or_default();

    let link = cli.link.as_deref().map(str::trim).filter(|l| !l.is_empty());
    if link.is_none() && handle.is_empty() && name.is_empty() {
        return Err(ScoutError::InvalidInput(
            "nothing to resolve: pass --link, or --handle and/or --name".to_string(),
        )
        .into());
    }

    let config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let source = Arc::new(GatewayClient::new(&config.gateway)?);
    let resolver = Resolver::new(source, config);

    let result = match link {
        Some(link) => {
            let link = expand_link(link, &resolver.config().platform.short_link_hosts).await?;
            normalize(&link)?;
            resolver.resolve_from_post_link(&link).await
        }
        None => resolver.resolve_from_identity(handle, name).await,
    };

    tracing::debug!(resolved = result.resolved, count = result.posts.len(), "Resolution finished");

    let rendered = render(&result, format, &resolver.config().platform.web_base)?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    Ok(result.resolved)
}

/// Expand a share short link; anything else passes through
async fn expand_link(link: &str, hosts: &[String]) -> Result<String> {
    if !shortlink::is_short_link(link, hosts) {
        return Ok(link.to_string());
    }

    let client = shortlink::short_link_client()?;
    Ok(shortlink::resolve_short_url(&client, link).await)
}
