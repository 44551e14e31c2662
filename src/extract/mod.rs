//! Email extraction from fetched resources
//!
//! The extractor is a pure function of the resource bytes and its
//! [`ContentKind`]. Each kind has its own text recovery strategy; the email
//! pattern is then applied to the recovered text.

mod docx;
mod html;
mod kind;
mod patterns;
mod pdf;

pub use docx::{docx_text, legacy_doc_text};
pub use html::extract_html;
pub use kind::ContentKind;
pub use patterns::{is_plausible_address, scan_text};
pub use pdf::pdf_text;

#[cfg(test)]
pub(crate) use docx::fixtures::docx_with_paragraphs;
#[cfg(test)]
pub(crate) use pdf::fixtures::pdf_with_lines;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ExtractionError;

/// How an address was recovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    MailtoLink,
    HtmlText,
    PlainText,
    PdfText,
    DocxText,
    DocStrings,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MailtoLink => "mailto_link",
            Self::HtmlText => "html_text",
            Self::PlainText => "plain_text",
            Self::PdfText => "pdf_text",
            Self::DocxText => "docx_text",
            Self::DocStrings => "doc_strings",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An address together with where and how it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEmail {
    pub address: String,
    pub source_url: String,
    pub method: ExtractionMethod,
}

/// Returns the set of addresses contained in `bytes`
///
/// Output is lowercased and deterministic for identical input. Unknown
/// content yields an empty set; undecodable PDF/DOCX files are errors.
pub fn extract(bytes: &[u8], kind: ContentKind) -> Result<BTreeSet<String>, ExtractionError> {
    Ok(extract_with_methods(bytes, kind)?.into_keys().collect())
}

/// Like [`extract`], keeping the method that first produced each address
pub fn extract_with_methods(
    bytes: &[u8],
    kind: ContentKind,
) -> Result<BTreeMap<String, ExtractionMethod>, ExtractionError> {
    let found = match kind {
        ContentKind::Html => extract_html(&String::from_utf8_lossy(bytes)),
        ContentKind::Text => tag(scan_text(&String::from_utf8_lossy(bytes)), ExtractionMethod::PlainText),
        ContentKind::Pdf => tag(scan_text(&pdf_text(bytes)?), ExtractionMethod::PdfText),
        ContentKind::Docx => tag(scan_text(&docx_text(bytes)?), ExtractionMethod::DocxText),
        ContentKind::Doc => tag(scan_text(&legacy_doc_text(bytes)), ExtractionMethod::DocStrings),
        ContentKind::Unknown => BTreeMap::new(),
    };

    Ok(found)
}

/// Extracts and attributes every address to `source_url`
pub fn extract_emails(
    bytes: &[u8],
    kind: ContentKind,
    source_url: &str,
) -> Result<Vec<ExtractedEmail>, ExtractionError> {
    Ok(extract_with_methods(bytes, kind)?
        .into_iter()
        .map(|(address, method)| ExtractedEmail {
            address,
            source_url: source_url.to_string(),
            method,
        })
        .collect())
}

fn tag(addresses: BTreeSet<String>, method: ExtractionMethod) -> BTreeMap<String, ExtractionMethod> {
    addresses.into_iter().map(|a| (a, method)).collect()
}
