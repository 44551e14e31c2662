//! HTML parser for extracting the links to follow from a page
//!
//! Each link is tagged with the content kind its path suggests, so linked
//! documents are queued alongside ordinary pages.

use crate::extract::ContentKind;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Absolute URL, not yet normalized
    pub url: String,
    /// Kind suggested by the path extension
    pub hint: ContentKind,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Followable links in document order, without duplicates
    pub links: Vec<DiscoveredLink>,
}

/// Link-bearing elements and the attribute holding the target
const LINK_SOURCES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("area[href]", "href"),
    ("link[rel='canonical'][href]", "href"),
    ("link[rel='alternate'][href]", "href"),
    ("iframe[src]", "src"),
    ("frame[src]", "src"),
];

/// Parses HTML content and extracts the followable links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href>` and `<area href>`, including `download` links to documents
/// - `<link rel="canonical">` and `<link rel="alternate">`
/// - `<iframe src>` and `<frame src>`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Static assets (images, scripts, stylesheets, fonts, archives, media)
///
/// Relative links resolve against `<base href>` when present, otherwise
/// against `page_url`.
pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let base_url = extract_base(&document, page_url).unwrap_or_else(|| page_url.clone());

    ParsedPage {
        links: extract_links(&document, &base_url),
    }
}

fn extract_base(document: &Html, page_url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    page_url
        .join(href.trim())
        .ok()
        .filter(|u| u.scheme() == "http" || u.scheme() == "https")
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<DiscoveredLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for (css, attr) in LINK_SOURCES {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(absolute) = element
                .value()
                .attr(attr)
                .and_then(|href| resolve_link(href, base_url))
            else {
                continue;
            };

            let Some(hint) = ContentKind::from_path(absolute.path()) else {
                continue;
            };

            let url = absolute.to_string();
            if seen.insert(url.clone()) {
                links.push(DiscoveredLink { url, hint });
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.get(..11).unwrap_or(href).to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|u| u.scheme() == "http" || u.scheme() == "https")
}
