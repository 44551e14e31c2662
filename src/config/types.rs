use serde::Deserialize;

/// Main configuration structure for Shadow-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// What to harvest
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Root URL or bare domain of the run
    pub url: String,

    /// Extra paths joined onto the target and seeded at depth 0
    #[serde(rename = "seed-paths", default = "default_seed_paths")]
    pub seed_paths: Vec<String>,

    /// Whether subdomains of the target count as in scope
    #[serde(rename = "include-subdomains", default = "default_true")]
    pub include_subdomains: bool,

    /// Subdomain labels (`staff`, `cs`) whose roots are seeded at depth 0
    /// when `include-subdomains` is set
    #[serde(rename = "seed-subdomains", default)]
    pub seed_subdomains: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URLs
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of resources dispatched in one run
    #[serde(rename = "page-budget", default = "default_page_budget")]
    pub page_budget: u32,

    /// Maximum number of fetch pipelines in flight
    #[serde(rename = "max-concurrent-fetches", default = "default_concurrency")]
    pub max_concurrent_fetches: u32,

    /// Overall run timeout in seconds (0 = unbounded)
    #[serde(rename = "run-timeout-secs", default)]
    pub run_timeout_secs: u64,

    /// Whether to honour robots.txt
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Random pause after each fetch, `[min, max]` milliseconds
    #[serde(rename = "delay-ms", default)]
    pub delay_ms: [u64; 2],
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-fetch timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per resource, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay (milliseconds); doubles each attempt
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on the retry delay (milliseconds)
    #[serde(rename = "backoff-max-ms", default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// User-Agent strings; one is picked at random per request
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Response bodies larger than this are truncated
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Consecutive failures before a route is degraded
    #[serde(rename = "degraded-after", default = "default_degraded_after")]
    pub degraded_after: u32,

    /// Consecutive failures before a route is banned for the run
    #[serde(rename = "banned-after", default = "default_banned_after")]
    pub banned_after: u32,

    /// How long the pool may stay exhausted before the run aborts (seconds)
    #[serde(rename = "exhaustion-grace-secs", default = "default_grace_secs")]
    pub exhaustion_grace_secs: u64,

    /// How often an exhausted pool is polled again (milliseconds)
    #[serde(rename = "exhaustion-poll-ms", default = "default_poll_ms")]
    pub exhaustion_poll_ms: u64,

    /// Egress routes; empty means a single direct route
    #[serde(rename = "route", default)]
    pub routes: Vec<RouteEntry>,
}

/// Transport used by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Direct,
    Socks,
    Tor,
}

/// One configured egress route
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub kind: TransportKind,

    /// `host:port` of the SOCKS endpoint (unused for direct routes)
    #[serde(default)]
    pub address: Option<String>,
}

/// Address filtering configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractConfig {
    /// Keep only addresses at the target's base domain or its subdomains
    #[serde(rename = "restrict-to-target-domain", default)]
    pub restrict_to_target_domain: bool,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV result table
    pub path: String,

    /// Optional path to a JSON report
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,

    /// Separator between source URLs in the `source_urls` column
    #[serde(rename = "source-delimiter", default = "default_source_delimiter")]
    pub source_delimiter: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            page_budget: default_page_budget(),
            max_concurrent_fetches: default_concurrency(),
            run_timeout_secs: 0,
            respect_robots: true,
            delay_ms: [0, 0],
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            user_agents: default_user_agents(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            degraded_after: default_degraded_after(),
            banned_after: default_banned_after(),
            exhaustion_grace_secs: default_grace_secs(),
            exhaustion_poll_ms: default_poll_ms(),
            routes: Vec::new(),
        }
    }
}

/// Default Tor SOCKS endpoint
pub const DEFAULT_TOR_ADDRESS: &str = "127.0.0.1:9050";

/// Directory-style pages that tend to list staff addresses
fn default_seed_paths() -> Vec<String> {
    [
        "/staff",
        "/faculty",
        "/people",
        "/directory",
        "/contact",
        "/about",
        "/team",
        "/researchers",
        "/students",
        "/alumni",
        "/wp-content/uploads",
    ]
    .iter()
    .map(|path| path.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    3
}

fn default_page_budget() -> u32 {
    500
}

fn default_concurrency() -> u32 {
    16
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    8_000
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_degraded_after() -> u32 {
    2
}

fn default_banned_after() -> u32 {
    5
}

fn default_grace_secs() -> u64 {
    60
}

fn default_poll_ms() -> u64 {
    1_000
}

fn default_source_delimiter() -> String {
    " | ".to_string()
}
