use anyhow::{Context, Result};
use citation_search::api::{self, AppState, SERVICE_NAME};
use citation_search::config::{find_config_file, load_config, load_from_env, Config, ENV_PREFIX};
use citation_search::models::{HealthStatus, SearchRequest, SearchResult};
use citation_search::SearchOrchestrator;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Citation Search - ranked literature search across Google Scholar mirrors and CNKI
#[derive(Parser, Debug)]
#[command(name = "citation-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ranked literature search across Google Scholar mirrors and CNKI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for citations matching a free-text query
    #[command(alias = "s")]
    Search {
        /// What to look for (at most 500 characters)
        query: String,

        /// Query live providers even if the configuration disables the crawler
        #[arg(long)]
        live: bool,
    },

    /// Run the HTTP service
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print service health and the configured providers
    Health,

    /// Print the effective configuration as TOML
    Config,
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Citation Search - Environment Variables");
    println!();
    println!("Crawler:");
    println!("  {ENV_PREFIX}_CRAWLER__ENABLED          Query live providers (default: false)");
    println!("  {ENV_PREFIX}_CRAWLER__RATE_LIMIT       Requests per second per provider (default: 0.4)");
    println!("  {ENV_PREFIX}_CRAWLER__USER_AGENT       User-Agent sent to external sites");
    println!("  {ENV_PREFIX}_CRAWLER__MOCK_SEED        Seed for reproducible mock data");
    println!();
    println!("Google Scholar:");
    println!("  {ENV_PREFIX}_GOOGLE_SCHOLAR__MIRROR_URL        Primary mirror");
    println!("  {ENV_PREFIX}_GOOGLE_SCHOLAR__FALLBACK_MIRRORS  Comma-separated fallback mirrors");
    println!("  {ENV_PREFIX}_GOOGLE_SCHOLAR__TIMEOUT_SECS      Per-mirror timeout (default: 30)");
    println!("  {ENV_PREFIX}_GOOGLE_SCHOLAR__MOCK_FALLBACK     Serve mock data when all mirrors fail (default: false)");
    println!();
    println!("CNKI:");
    println!("  {ENV_PREFIX}_CNKI__BASE_URL        Site root (default: https://kns.cnki.net)");
    println!("  {ENV_PREFIX}_CNKI__TIMEOUT_SECS    Timeout (default: 15)");
    println!("  {ENV_PREFIX}_CNKI__MOCK_FALLBACK   Serve mock data on failure (default: true)");
    println!();
    println!("Search and server:");
    println!("  {ENV_PREFIX}_SEARCH__GLOBAL_DEADLINE_SECS  Deadline for a whole search (default: 45)");
    println!("  {ENV_PREFIX}_SERVER__HOST                  Bind address (default: 0.0.0.0)");
    println!("  {ENV_PREFIX}_SERVER__PORT                  Port (default: 8080)");
    println!();
    println!("Other Settings:");
    println!("  AI_SERVICE_API_KEY          API key for the keyword AI service");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_CRAWLER__ENABLED=true");
    println!("  export {ENV_PREFIX}_GOOGLE_SCHOLAR__FALLBACK_MIRRORS=\"https://scholar.lanfanshu.cn,https://sc.panda321.com\"");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                format!("citation_search={},tower_http={}", env_filter, env_filter)
            }),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = resolve_config(cli.config.as_ref())?;

    match cli.command {
        Some(Commands::Search { query, live }) => {
            let request = SearchRequest::new(query);
            request.validate()?;

            if live {
                config.crawler.enabled = true;
            }

            let orchestrator = SearchOrchestrator::from_config(&config)?;
            let result = orchestrator.search(&request.query).await;
            output_result(&result, cli.output, cli.quiet)?;

            if !result.success {
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", host, port))?;

            let orchestrator = SearchOrchestrator::from_config(&config)?;
            api::serve(AppState::new(orchestrator), addr).await?;
        }
        Some(Commands::Health) => {
            let status = HealthStatus::up(SERVICE_NAME);
            let orchestrator = SearchOrchestrator::from_config(&config)?;
            output_health(&status, &orchestrator, &config, cli.output)?;
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
        }
        None => {
            println!("Citation Search v{}", citation_search::VERSION);
            println!();
            println!("Use --help to see available commands.");
        }
    }

    Ok(())
}

/// Load configuration from `--config`, a default location, or the environment
fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        return load_config(path)
            .with_context(|| format!("failed to load config file {}", path.display()));
    }

    if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        return load_config(&path)
            .with_context(|| format!("failed to load config file {}", path.display()));
    }

    Ok(load_from_env()?)
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn output_result(result: &SearchResult, format: OutputFormat, quiet: bool) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Plain => {
            if !quiet {
                println!("{} ({} ms)", result.message, result.duration_ms());
                println!("Keywords: {}", result.keywords.join(", "));
                println!();
            }
            for citation in &result.citations {
                println!(
                    "[{:.1}] {} - {} ({}, {})",
                    citation.relevance_score.unwrap_or_default(),
                    citation.title,
                    citation.author_line(),
                    citation.source,
                    citation.year
                );
                println!("  URL: {}", citation.url);
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};

            if !quiet {
                println!("{} ({} ms)", result.message, result.duration_ms());
                println!("Keywords: {}", result.keywords.join(", "));
            }

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Score", "Title", "Authors", "Venue", "Year", "Cited", "Source"]);

            for citation in &result.citations {
                table.add_row(vec![
                    Cell::new(format!("{:.1}", citation.relevance_score.unwrap_or_default())),
                    Cell::new(truncate_chars(&citation.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate_chars(&citation.author_line(), 30)),
                    Cell::new(truncate_chars(&citation.source, 30)),
                    Cell::new(citation.year),
                    Cell::new(citation.citation_count),
                    Cell::new(citation.data_source.name()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

fn output_health(
    status: &HealthStatus,
    orchestrator: &SearchOrchestrator,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => {
            let providers: Vec<serde_json::Value> = orchestrator
                .registry()
                .calls()
                .iter()
                .map(|call| {
                    serde_json::json!({
                        "id": call.provider_id(),
                        "name": call.provider_name(),
                        "chain": call.chain_len(),
                        "mockFallback": call.has_degradation(),
                        "timeoutSecs": call.timeout().as_secs(),
                    })
                })
                .collect();
            let body = serde_json::json!({
                "status": status.status,
                "service": status.service,
                "timestamp": status.timestamp,
                "crawlerEnabled": config.crawler.enabled,
                "providers": providers,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            use comfy_table::Table;

            println!("{} {} (crawler {})", status.service, status.status, if config.crawler.enabled {
                "enabled"
            } else {
                "disabled"
            });

            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Provider", "Name", "Chain", "Mock fallback", "Timeout"]);
            for call in orchestrator.registry().calls() {
                table.add_row(vec![
                    call.provider_id().to_string(),
                    call.provider_name().to_string(),
                    call.chain_len().to_string(),
                    if call.has_degradation() { "yes" } else { "no" }.to_string(),
                    format!("{}s", call.timeout().as_secs()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
