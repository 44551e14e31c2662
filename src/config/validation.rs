use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, ProxyConfig, RouteEntry, TargetConfig,
    TransportKind,
};
use crate::ConfigError;
use std::net::IpAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_proxy_config(&config.proxy)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Turns the configured target into an absolute URL
///
/// Bare domains (`example.com`) get `https://` prepended. The host must be an
/// IP address, `localhost`, or a domain containing at least one dot.
pub fn resolve_target(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::InvalidUrl("target url cannot be empty".to_string()));
    }

    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target '{}': {}", raw, e)))?;

    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::InvalidUrl(format!("Target '{}' has no host", raw)))?;

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_err() && bare != "localhost" {
        validate_domain_string(bare)?;
    }

    Ok(url)
}

fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    resolve_target(&config.url)?;

    for path in &config.seed_paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "seed path '{}' must start with '/'",
                path
            )));
        }
    }

    for label in &config.seed_subdomains {
        validate_subdomain_label(label)?;
    }

    Ok(())
}

/// A seed subdomain is one or more DNS labels, without the base domain
fn validate_subdomain_label(label: &str) -> Result<(), ConfigError> {
    let valid = !label.is_empty()
        && label.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with('-')
                && !part.ends_with('-')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "seed subdomain '{}' must be a DNS label such as 'staff'",
            label
        )))
    }
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 256 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-fetches must be between 1 and 256, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.page_budget < 1 {
        return Err(ConfigError::Validation(
            "page-budget must be >= 1".to_string(),
        ));
    }

    let [min, max] = config.delay_ms;
    if min > max {
        return Err(ConfigError::Validation(format!(
            "delay-ms minimum ({}) exceeds maximum ({})",
            min, max
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-base-ms ({}) exceeds backoff-max-ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.user_agents.is_empty() || config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents must contain at least one non-empty entry".to_string(),
        ));
    }

    if config.max_body_bytes == 0 {
        return Err(ConfigError::Validation(
            "max-body-bytes must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.degraded_after < 1 {
        return Err(ConfigError::Validation(
            "degraded-after must be >= 1".to_string(),
        ));
    }

    if config.banned_after <= config.degraded_after {
        return Err(ConfigError::Validation(format!(
            "banned-after ({}) must be greater than degraded-after ({})",
            config.banned_after, config.degraded_after
        )));
    }

    if config.exhaustion_poll_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "exhaustion-poll-ms must be >= 10ms, got {}ms",
            config.exhaustion_poll_ms
        )));
    }

    for route in &config.routes {
        validate_route(route)?;
    }

    Ok(())
}

fn validate_route(route: &RouteEntry) -> Result<(), ConfigError> {
    match (route.kind, route.address.as_deref()) {
        (TransportKind::Direct, Some(address)) => Err(ConfigError::Validation(format!(
            "direct route cannot have an address (got '{}')",
            address
        ))),
        (TransportKind::Socks, None) => Err(ConfigError::Validation(
            "socks route requires an address".to_string(),
        )),
        (_, Some(address)) => validate_socket_address(address),
        _ => Ok(()),
    }
}

/// Checks a `host:port` pair
fn validate_socket_address(address: &str) -> Result<(), ConfigError> {
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ConfigError::Validation(format!("proxy address '{}' must be host:port", address))
    })?;

    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "proxy address '{}' has an empty host",
            address
        )));
    }

    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "proxy address '{}' has an invalid port",
            address
        ))),
    }
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if matches!(config.json_path.as_deref(), Some(p) if p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "json-path cannot be empty when set".to_string(),
        ));
    }

    if config.source_delimiter.is_empty() {
        return Err(ConfigError::Validation(
            "source-delimiter cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidUrl("Domain cannot be empty".to_string()));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidUrl(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidUrl(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidUrl(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidUrl(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
