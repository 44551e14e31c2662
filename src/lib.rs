//! Shadow-Harvester: an anonymized email harvester
//!
//! This crate crawls a target domain and the documents it links to, extracts
//! email addresses from HTML, PDF and Word files, and exports a deduplicated
//! table of addresses with their provenance. Requests can be routed through
//! direct connections, SOCKS proxies or a local Tor daemon.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod proxy;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Shadow-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failures while retrieving a resource
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Timeouts, resets and server hiccups; another attempt may succeed
    #[error("Transient fetch failure for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// 4xx responses and explicit blocks; retrying will not help
    #[error("Permanent fetch failure for {url}: HTTP {status_code}")]
    Permanent { url: String, status_code: u16 },

    /// No healthy or degraded route remained for longer than the grace period
    #[error("Proxy pool exhausted after waiting {waited_secs}s")]
    ProxyExhausted { waited_secs: u64 },
}

impl FetchError {
    /// Returns true if another attempt with a fresh route is worthwhile
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// A document could not be decoded; the document is skipped
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Malformed PDF: {0}")]
    Pdf(String),

    #[error("Malformed DOCX: {0}")]
    Docx(String),
}

/// The result table could not be written
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Destination {path} is not writable: {source}")]
    Unwritable {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Shadow-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use aggregate::{Aggregator, ResultSet};
pub use config::Config;
pub use crawler::{harvest, Crawler, RunReport};
pub use extract::{extract, ContentKind};
pub use proxy::{ProxyPool, ProxyRoute};
pub use state::RunState;
pub use crate::url::{base_domain, normalize_url, Scope};
