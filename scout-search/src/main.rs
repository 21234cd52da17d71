//! scout-search - Keyword post search with platform filters

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use libnotescout::logging::{LogFormat, LoggingConfig};
use libnotescout::output::{render, OutputFormat};
use libnotescout::platforms::gateway::GatewayClient;
use libnotescout::platforms::{Distance, FilterSet, GeoPoint, NoteRange, NoteTime, NoteType, SortOrder};
use libnotescout::{Config, Resolver, ScoutError};

#[derive(Parser, Debug)]
#[command(name = "scout-search")]
#[command(version, about = "Search posts by keyword")]
#[command(long_about = r#"Search posts by keyword and print the top results as canonical links.
No author filtering is applied; results keep the platform's ranking.

EXAMPLES:
    # Top 20 posts (default limit from config)
    scout-search "hiking shoes"

    # Latest 50 video posts from the past week
    scout-search "hiking shoes" --limit 50 --sort latest --note-type video --note-time week

    # Posts near a location
    scout-search "coffee" --distance nearby --geo 31.2304,121.4737

    # JSON lines for scripting
    scout-search "coffee" --format jsonl | jq -r .url

FILTERS:
    --sort        general, latest, most-liked, most-commented, most-collected
    --note-type   any, video, normal
    --note-time   any, day, week, half-year
    --note-range  any, seen, unseen, following
    --distance    any, same-city, nearby (requires --geo)

EXIT CODES:
    0 - At least one post found
    1 - No posts found, or a runtime error
    2 - Usage error, or the gateway refused the session
    3 - Invalid input (bad filter value, zero limit)
"#)]
struct Cli {
    /// Search keywords
    #[arg(value_name = "QUERY")]
    query: String,

    /// Maximum number of posts to return
    #[arg(short, long, value_name = "N")]
    #[arg(help = "Maximum number of posts to return (default: discovery.query_default_count)")]
    limit: Option<usize>,

    /// Result ordering
    #[arg(long, default_value = "general", value_name = "ORDER")]
    sort: String,

    /// Post type filter
    #[arg(long, default_value = "any", value_name = "TYPE")]
    note_type: String,

    /// Publish time filter
    #[arg(long, default_value = "any", value_name = "TIME")]
    note_time: String,

    /// Viewer relationship filter
    #[arg(long, default_value = "any", value_name = "RANGE")]
    note_range: String,

    /// Distance filter
    #[arg(long, default_value = "any", value_name = "DISTANCE")]
    distance: String,

    /// Location for distance filters, as LAT,LON
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    geo: Option<String>,

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

fn invalid(msg: String) -> ScoutError {
    ScoutError::InvalidInput(msg)
}

fn parse_filters(cli: &Cli) -> Result<FilterSet> {
    let geo = cli
        .geo
        .as_deref()
        .map(str::parse::<GeoPoint>)
        .transpose()
        .map_err(invalid)?;

    let filters = FilterSet {
        sort: cli.sort.parse::<SortOrder>().map_err(invalid)?,
        note_type: cli.note_type.parse::<NoteType>().map_err(invalid)?,
        note_time: cli.note_time.parse::<NoteTime>().map_err(invalid)?,
        note_range: cli.note_range.parse::<NoteRange>().map_err(invalid)?,
        distance: cli.distance.parse::<Distance>().map_err(invalid)?,
        geo,
    };
    filters.validate()?;
    Ok(filters)
}

/// Returns whether any post was found
async fn run(cli: Cli) -> Result<bool> {
    let format: OutputFormat = cli.format.parse()?;

    let query = cli.query.trim();
    if query.is_empty() {
        return Err(invalid("search query is empty".to_string()).into());
    }
    if cli.limit == Some(0) {
        return Err(invalid("--limit must be at least 1".to_string()).into());
    }
    let filters = parse_filters(&cli)?;

    let config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let limit = cli.limit.unwrap_or(config.discovery.query_default_count);

    let source = Arc::new(GatewayClient::new(&config.gateway)?);
    let resolver = Resolver::new(source, config);

    tracing::debug!(query, limit, ?filters, "Searching");
    let result = resolver.resolve_from_query_with(query, limit, &filters).await;

    let rendered = render(&result, format, &resolver.config().platform.web_base)?;
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    Ok(result.resolved)
}
