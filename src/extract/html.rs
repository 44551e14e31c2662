use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

use super::patterns::{is_plausible_address, scan_text};
use super::ExtractionMethod;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector is valid"));

/// Addresses in an HTML page, from `mailto:` links and from visible text
pub fn extract_html(html: &str) -> BTreeMap<String, ExtractionMethod> {
    let document = Html::parse_document(html);
    let mut found = BTreeMap::new();

    for element in document.select(&LINK_SELECTOR) {
        let href = element.value().attr("href").unwrap_or("").trim();
        if !href.get(..7).is_some_and(|s| s.eq_ignore_ascii_case("mailto:")) {
            continue;
        }
        for address in mailto_addresses(href) {
            found.entry(address).or_insert(ExtractionMethod::MailtoLink);
        }
    }

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    for address in scan_text(&text) {
        found.entry(address).or_insert(ExtractionMethod::HtmlText);
    }

    found
}

/// `mailto:a@b.com,c@d.com?subject=hi` yields both recipients
fn mailto_addresses(href: &str) -> Vec<String> {
    let rest = href.get(7..).unwrap_or("");
    let recipients = rest.split('?').next().unwrap_or("");

    recipients
        .split(',')
        .map(|part| percent_decode(part.trim()).to_lowercase())
        .filter(|candidate| is_plausible_address(candidate))
        .collect()
}

fn percent_decode(input: &str) -> String {
    url::form_urlencoded::parse(format!("v={}", input.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| input.to_string())
}
