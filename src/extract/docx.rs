use std::io::{Cursor, Read};

use crate::ExtractionError;

const MAIN_PART: &str = "word/document.xml";

/// Minimum printable run kept when scanning legacy binary documents
const MIN_RUN: usize = 4;

/// Text of a DOCX body plus its headers, footers and notes
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut parts: Vec<String> = archive
        .file_names()
        .filter(|name| is_text_part(name))
        .map(String::from)
        .collect();

    if !parts.iter().any(|name| name == MAIN_PART) {
        return Err(ExtractionError::Docx(format!("missing {}", MAIN_PART)));
    }
    parts.sort_by_key(|name| (name != MAIN_PART, name.clone()));

    let mut text = String::new();
    for name in parts {
        let mut file = archive
            .by_name(&name)
            .map_err(|e| ExtractionError::Docx(e.to_string()))?;
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| ExtractionError::Docx(format!("{}: {}", name, e)))?;

        text.push_str(&xml_text(&xml));
        text.push('\n');
    }

    Ok(text)
}

fn is_text_part(name: &str) -> bool {
    if name == MAIN_PART {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    file.ends_with(".xml")
        && !file.contains('/')
        && (file.starts_with("header")
            || file.starts_with("footer")
            || file == "footnotes.xml"
            || file == "endnotes.xml")
}

/// Strips WordprocessingML markup, keeping paragraph and tab boundaries
fn xml_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        out.push_str(&unescape(&rest[..open]));
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };

        let tag = after[..close].trim_end_matches('/');
        let name = tag.split_whitespace().next().unwrap_or("");
        match name {
            "/w:p" | "w:br" | "w:cr" => out.push('\n'),
            "w:tab" => out.push('\t'),
            _ => {}
        }
        rest = &after[close + 1..];
    }
    out.push_str(&unescape(rest));

    out
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Printable string runs of a legacy binary Word file
///
/// Word 97-2003 stores body text either as 8-bit characters or as UTF-16LE,
/// so both encodings are scanned.
pub fn legacy_doc_text(bytes: &[u8]) -> String {
    let mut runs: Vec<String> = Vec::new();

    let mut current = String::new();
    for &b in bytes {
        if is_printable(b) {
            current.push(b as char);
        } else {
            flush_run(&mut current, &mut runs);
        }
    }
    flush_run(&mut current, &mut runs);

    for offset in 0..2 {
        for pair in bytes[offset.min(bytes.len())..].chunks_exact(2) {
            if pair[1] == 0 && is_printable(pair[0]) {
                current.push(pair[0] as char);
            } else {
                flush_run(&mut current, &mut runs);
            }
        }
        flush_run(&mut current, &mut runs);
    }

    runs.join("\n")
}

fn is_printable(b: u8) -> bool {
    b.is_ascii_graphic() || b == b' '
}

fn flush_run(current: &mut String, runs: &mut Vec<String>) {
    if current.len() >= MIN_RUN {
        runs.push(std::mem::take(current));
    } else {
        current.clear();
    }
}
