use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shadow_harvester::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the site's base domain: the lowercase host without a leading `www.`
///
/// ```
/// use url::Url;
/// use shadow_harvester::url::base_domain;
///
/// let url = Url::parse("https://www.Example.com/").unwrap();
/// assert_eq!(base_domain(&url), Some("example.com".to_string()));
/// ```
pub fn base_domain(url: &Url) -> Option<String> {
    extract_domain(url).map(|host| match host.strip_prefix("www.") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => host,
    })
}

/// Checks whether `candidate` equals `base` or is one of its subdomains
pub fn is_within_domain(candidate: &str, base: &str) -> bool {
    let candidate = candidate.trim_end_matches('.');
    candidate.eq_ignore_ascii_case(base)
        || (candidate.len() > base.len()
            && candidate.to_ascii_lowercase().ends_with(&format!(".{}", base)))
}
