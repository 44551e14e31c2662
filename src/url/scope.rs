use crate::url::domain::{base_domain, extract_domain, is_within_domain};
use url::Url;

/// Decides which URLs belong to the target site
///
/// `www.` and bare hosts are the same site. Subdomains are in scope only when
/// `include_subdomains` is set. Only http and https URLs are ever in scope.
#[derive(Debug, Clone)]
pub struct Scope {
    base: String,
    include_subdomains: bool,
}

impl Scope {
    /// Builds the scope for a target URL; `None` if the URL has no host
    pub fn for_target(target: &Url, include_subdomains: bool) -> Option<Self> {
        Some(Self {
            base: base_domain(target)?,
            include_subdomains,
        })
    }

    /// The target's base domain
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns true if the URL may be crawled
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match extract_domain(url) {
            Some(h) => h,
            None => return false,
        };
        let host = host.strip_prefix("www.").unwrap_or(&host);

        if self.include_subdomains {
            is_within_domain(host, &self.base)
        } else {
            host == self.base
        }
    }

    /// Returns true if an email domain belongs to the target
    pub fn owns_email_domain(&self, domain: &str) -> bool {
        is_within_domain(domain, &self.base)
    }
}
