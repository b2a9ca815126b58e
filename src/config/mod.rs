//! Configuration management.
//!
//! Settings come from an optional TOML file layered under environment
//! variables. Every field has a default, so an empty file (or none at all)
//! yields a working mock-only setup.
//!
//! # Configuration File Format
//!
//! ```toml
//! [crawler]
//! enabled = true
//! rate_limit = 0.4
//! user_agent = "Mozilla/5.0 (Educational Purpose; Citation Research System)"
//! mock_seed = 42
//!
//! [google_scholar]
//! mirror_url = "https://www.defineabc.com"
//! fallback_mirrors = ["https://scholar.lanfanshu.cn", "https://sc.panda321.com"]
//! timeout_secs = 30
//! mock_fallback = false
//!
//! [cnki]
//! base_url = "https://kns.cnki.net"
//! timeout_secs = 15
//! mock_fallback = true
//!
//! [search]
//! global_deadline_secs = 45
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```
//!
//! # Environment Overrides
//!
//! Variables use the `CITATION_SEARCH_` prefix and `__` between section and
//! key, e.g. `CITATION_SEARCH_CRAWLER__ENABLED=true` or
//! `CITATION_SEARCH_GOOGLE_SCHOLAR__FALLBACK_MIRRORS=https://a,https://b`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use config::ConfigError;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "CITATION_SEARCH";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "citation-search.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Live crawling and rate limiting
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Google Scholar mirrors
    #[serde(default)]
    pub google_scholar: GoogleScholarConfig,

    /// CNKI endpoint
    #[serde(default)]
    pub cnki: CnkiConfig,

    /// Search orchestration
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP service
    #[serde(default)]
    pub server: ServerConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Crawler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// `true` queries live providers, `false` serves mock data only
    #[serde(default)]
    pub enabled: bool,

    /// Steady-state permits per second for each live provider
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// User-Agent sent to external sites
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seed for mock data; unset means a fresh sequence per process
    #[serde(default)]
    pub mock_seed: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_limit: default_rate_limit(),
            user_agent: default_user_agent(),
            mock_seed: None,
        }
    }
}

fn default_rate_limit() -> f64 {
    0.4
}

fn default_user_agent() -> String {
    crate::utils::DEFAULT_USER_AGENT.to_string()
}

/// Google Scholar mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleScholarConfig {
    /// Mirror tried first
    #[serde(default = "default_mirror_url")]
    pub mirror_url: String,

    /// Mirrors tried in order when the primary fails
    #[serde(default = "default_fallback_mirrors")]
    pub fallback_mirrors: Vec<String>,

    /// Per-mirror time budget in seconds
    #[serde(default = "default_scholar_timeout")]
    pub timeout_secs: u64,

    /// Serve mock data when every mirror fails
    #[serde(default)]
    pub mock_fallback: bool,
}

impl Default for GoogleScholarConfig {
    fn default() -> Self {
        Self {
            mirror_url: default_mirror_url(),
            fallback_mirrors: default_fallback_mirrors(),
            timeout_secs: default_scholar_timeout(),
            mock_fallback: false,
        }
    }
}

impl GoogleScholarConfig {
    /// Primary mirror followed by the fallbacks, without repeats
    pub fn mirror_chain(&self) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        for mirror in std::iter::once(&self.mirror_url).chain(&self.fallback_mirrors) {
            let mirror = mirror.trim().trim_end_matches('/');
            if !mirror.is_empty() && !chain.iter().any(|m| m == mirror) {
                chain.push(mirror.to_string());
            }
        }
        chain
    }

    /// Per-mirror time budget
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_mirror_url() -> String {
    "https://www.defineabc.com".to_string()
}

fn default_fallback_mirrors() -> Vec<String> {
    vec![
        "https://www.defineabc.com".to_string(),
        "https://scholar.lanfanshu.cn".to_string(),
        "https://xs.dailyheadlines.cc".to_string(),
        "https://sc.panda321.com".to_string(),
    ]
}

fn default_scholar_timeout() -> u64 {
    30
}

/// CNKI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnkiConfig {
    /// Site root
    #[serde(default = "default_cnki_base_url")]
    pub base_url: String,

    /// Time budget in seconds
    #[serde(default = "default_cnki_timeout")]
    pub timeout_secs: u64,

    /// Serve mock data when the live fetch fails
    #[serde(default = "default_true")]
    pub mock_fallback: bool,
}

impl Default for CnkiConfig {
    fn default() -> Self {
        Self {
            base_url: default_cnki_base_url(),
            timeout_secs: default_cnki_timeout(),
            mock_fallback: true,
        }
    }
}

impl CnkiConfig {
    /// Time budget for one fetch
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_cnki_base_url() -> String {
    "https://kns.cnki.net".to_string()
}

fn default_cnki_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

/// Search orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hard cutoff for a whole search request, in seconds
    #[serde(default = "default_global_deadline")]
    pub global_deadline_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            global_deadline_secs: default_global_deadline(),
        }
    }
}

impl SearchConfig {
    /// Hard cutoff for a whole search request
    pub fn global_deadline(&self) -> Duration {
        Duration::from_secs(self.global_deadline_secs)
    }
}

fn default_global_deadline() -> u64 {
    45
}

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Key for the keyword AI service (unused by the built-in extractor)
    #[serde(default)]
    pub ai_service: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            ai_service: std::env::var("AI_SERVICE_API_KEY").ok(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("google_scholar.fallback_mirrors")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables and defaults only
pub fn load_from_env() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Looks for `./citation-search.toml`, then
/// `<config dir>/citation-search/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("citation-search").join("config.toml"))
        .filter(|path| path.is_file())
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
