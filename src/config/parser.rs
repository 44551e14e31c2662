use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at start-up so a result table can be traced back to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[target]
url = "https://example.com/"
seed-paths = ["/contact", "/staff"]

[crawler]
max-depth = 2
page-budget = 50
max-concurrent-fetches = 4

[fetch]
timeout-ms = 5000

[proxy]
degraded-after = 1
banned-after = 3

[[proxy.route]]
kind = "tor"

[[proxy.route]]
kind = "socks"
address = "10.0.0.5:1080"

[output]
path = "./emails.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.page_budget, 50);
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.target.seed_paths.len(), 2);
        assert!(config.target.include_subdomains);
        assert_eq!(config.proxy.routes.len(), 2);
        assert_eq!(config.proxy.routes[0].kind, TransportKind::Tor);
        assert_eq!(config.output.source_delimiter, " | ");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(
            r#"
[target]
url = "example.com"

[output]
path = "out.csv"
"#,
        )
        .unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert!(config.crawler.respect_robots);
        assert!(config.proxy.routes.is_empty());
        assert!(config.output.json_path.is_none());
        assert!(config.target.seed_paths.iter().any(|p| p == "/staff"));
        assert!(config.target.seed_paths.iter().any(|p| p == "/contact"));
        assert!(config.target.seed_subdomains.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_transport_kind_is_rejected() {
        let result = parse_config(
            r#"
[target]
url = "https://example.com/"

[[proxy.route]]
kind = "carrier-pigeon"

[output]
path = "out.csv"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config(
            r#"
[target]
url = "https://example.com/"

[crawler]
max-concurrent-fetches = 0

[output]
path = "out.csv"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
