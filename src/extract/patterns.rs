use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// local-part@domain where the domain has at least one dot and an alphabetic TLD
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,24}\b",
    )
    .expect("email pattern is valid")
});

/// TLDs that are really file extensions (`logo@2x.png`)
const FILE_LIKE_TLDS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "css", "js"];

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

/// Scans text for email addresses, lowercased and deduplicated
pub fn scan_text(text: &str) -> BTreeSet<String> {
    EMAIL_REGEX
        .find_iter(text)
        .filter_map(|m| {
            let candidate = m.as_str().trim_start_matches('.').to_lowercase();
            is_plausible_address(&candidate).then_some(candidate)
        })
        .collect()
}

/// Checks a lowercase candidate against the accepted address shape
pub fn is_plausible_address(candidate: &str) -> bool {
    if candidate.len() > MAX_ADDRESS_LEN {
        return false;
    }

    let Some((local, domain)) = candidate.rsplit_once('@') else {
        return false;
    };

    if local.is_empty()
        || local.len() > MAX_LOCAL_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }

    let Some((_, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !FILE_LIKE_TLDS.contains(&tld) && EMAIL_REGEX.is_match(candidate)
}
