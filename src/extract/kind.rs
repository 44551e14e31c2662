use std::fmt;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const DOCX_MAIN_PART: &[u8] = b"word/document.xml";

/// Path extensions that are never worth fetching
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "css", "js", "mjs",
    "map", "woff", "woff2", "ttf", "otf", "eot", "zip", "gz", "tgz", "rar", "7z", "tar", "mp3",
    "mp4", "m4a", "avi", "mov", "mkv", "webm", "wav", "ogg", "exe", "msi", "dmg", "iso", "apk",
];

/// Format of a fetched resource; selects the extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Html,
    Text,
    Pdf,
    Docx,
    Doc,
    Unknown,
}

impl ContentKind {
    /// Guesses the kind of a link target from its path extension
    ///
    /// Returns `None` for static assets that should not be crawled. Paths
    /// without a recognised extension are assumed to be pages.
    pub fn from_path(path: &str) -> Option<Self> {
        let last = path.rsplit('/').next().unwrap_or("");
        let ext = match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return Some(Self::Html),
        };

        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" | "csv" | "vcf" => Some(Self::Text),
            e if ASSET_EXTENSIONS.contains(&e) => None,
            _ => Some(Self::Html),
        }
    }

    /// Maps a `Content-Type` header value; `None` if it says nothing useful
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" | "application/octet-stream" | "binary/octet-stream" => None,
            "text/html" | "application/xhtml+xml" => Some(Self::Html),
            "application/pdf" | "application/x-pdf" => Some(Self::Pdf),
            "application/msword" => Some(Self::Doc),
            m if m.contains("wordprocessingml") => Some(Self::Docx),
            m if m.starts_with("text/") => Some(Self::Text),
            _ => Some(Self::Unknown),
        }
    }

    /// Determines the kind of a fetched body
    ///
    /// Priority: magic bytes, then the declared content type, then the hint
    /// taken from the link that led here.
    pub fn sniff(body: &[u8], content_type: Option<&str>, hint: ContentKind) -> Self {
        if let Some(kind) = Self::from_magic(body) {
            return kind;
        }

        if let Some(kind) = content_type.and_then(Self::from_content_type) {
            return kind;
        }

        hint
    }

    fn from_magic(body: &[u8]) -> Option<Self> {
        let head = &body[..body.len().min(1024)];
        let trimmed = match head.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(start) => &head[start..],
            None => return None,
        };

        if trimmed.starts_with(PDF_MAGIC) {
            Some(Self::Pdf)
        } else if body.starts_with(OLE_MAGIC) {
            Some(Self::Doc)
        } else if body.starts_with(ZIP_MAGIC) && contains(body, DOCX_MAIN_PART) {
            Some(Self::Docx)
        } else {
            None
        }
    }

    /// Returns true for resources that are documents rather than pages
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Doc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Doc => "doc",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(ContentKind::from_path("/files/report.PDF"), Some(ContentKind::Pdf));
        assert_eq!(ContentKind::from_path("/cv.docx"), Some(ContentKind::Docx));
        assert_eq!(ContentKind::from_path("/old.doc"), Some(ContentKind::Doc));
        assert_eq!(ContentKind::from_path("/staff"), Some(ContentKind::Html));
        assert_eq!(ContentKind::from_path("/"), Some(ContentKind::Html));
        assert_eq!(ContentKind::from_path("/index.php"), Some(ContentKind::Html));
        assert_eq!(ContentKind::from_path("/.well-known"), Some(ContentKind::Html));
        assert_eq!(ContentKind::from_path("/logo.png"), None);
        assert_eq!(ContentKind::from_path("/app.js"), None);
    }

    #[test]
    fn test_from_content_type() {
        assert_eq!(
            ContentKind::from_content_type("text/html; charset=utf-8"),
            Some(ContentKind::Html)
        );
        assert_eq!(
            ContentKind::from_content_type("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            Some(ContentKind::Docx)
        );
        assert_eq!(
            ContentKind::from_content_type("text/plain"),
            Some(ContentKind::Text)
        );
        assert_eq!(
            ContentKind::from_content_type("image/png"),
            Some(ContentKind::Unknown)
        );
        assert_eq!(ContentKind::from_content_type("application/octet-stream"), None);
    }

    #[test]
    fn test_magic_wins_over_header() {
        let body = b"%PDF-1.5\n...";
        assert_eq!(
            ContentKind::sniff(body, Some("text/html"), ContentKind::Html),
            ContentKind::Pdf
        );

        let mut ole = OLE_MAGIC.to_vec();
        ole.extend_from_slice(b"rest");
        assert_eq!(
            ContentKind::sniff(&ole, Some("application/octet-stream"), ContentKind::Unknown),
            ContentKind::Doc
        );
    }

    #[test]
    fn test_zip_without_word_part_is_not_docx() {
        let body = b"PK\x03\x04 some/other/file.txt";
        assert_eq!(
            ContentKind::sniff(body, Some("application/zip"), ContentKind::Html),
            ContentKind::Unknown
        );

        let docx = b"PK\x03\x04....word/document.xml....";
        assert_eq!(
            ContentKind::sniff(docx, None, ContentKind::Unknown),
            ContentKind::Docx
        );
    }

    #[test]
    fn test_hint_is_last_resort() {
        assert_eq!(
            ContentKind::sniff(b"hello", None, ContentKind::Text),
            ContentKind::Text
        );
        assert_eq!(
            ContentKind::sniff(b"hello", Some("application/octet-stream"), ContentKind::Pdf),
            ContentKind::Pdf
        );
    }
}
