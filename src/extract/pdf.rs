use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::ExtractionError;

/// A `TJ` adjustment wider than this (thousandths of an em) reads as a space
const WORD_GAP: f32 = 200.0;

/// Extracts the text layer of every page in a PDF
///
/// Text positioning operators become line breaks or spaces so that
/// neighbouring lines never run together. Pages whose content streams
/// cannot be decoded are skipped; a PDF without a text layer yields an
/// empty string. Only an unparseable file is an error.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let mut text = String::new();
    for (page_number, page_id) in document.get_pages() {
        match page_text(&document, page_id) {
            Ok(page_text) => {
                text.push_str(&page_text);
                line_break(&mut text);
            }
            Err(e) => debug!("Skipping unreadable PDF page {}: {}", page_number, e),
        }
    }

    Ok(text)
}

fn page_text(document: &Document, page_id: ObjectId) -> Result<String, lopdf::Error> {
    let content = Content::decode(&document.get_page_content(page_id)?)?;
    let mut text = String::new();

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "Tj" => push_strings(&mut text, operands),
            "'" | "\"" => {
                line_break(&mut text);
                push_strings(&mut text, operands);
            }
            "TJ" => {
                for item in operands.iter().flat_map(array_items) {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decode_string(bytes)),
                        other => {
                            if other.as_float().map_or(false, |gap| -gap > WORD_GAP) {
                                space(&mut text);
                            }
                        }
                    }
                }
            }
            "Td" | "TD" => {
                let moves_down = operands
                    .get(1)
                    .and_then(|ty| ty.as_float().ok())
                    .map_or(true, |ty| ty != 0.0);
                if moves_down {
                    line_break(&mut text);
                } else {
                    space(&mut text);
                }
            }
            "T*" | "Tm" | "ET" => line_break(&mut text),
            _ => {}
        }
    }

    Ok(text)
}

fn array_items(object: &Object) -> &[Object] {
    match object {
        Object::Array(items) => items,
        _ => &[],
    }
}

fn push_strings(text: &mut String, operands: &[Object]) {
    for operand in operands {
        if let Object::String(bytes, _) = operand {
            text.push_str(&decode_string(bytes));
        }
    }
}

fn line_break(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

fn space(text: &mut String) {
    if !text.is_empty() && !text.ends_with(char::is_whitespace) {
        text.push(' ');
    }
}

/// Decodes a string operand: UTF-16BE with a byte-order mark, else Latin-1
fn decode_string(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_lines;
    use super::*;

    #[test]
    fn test_extracts_text_layer() {
        let bytes = pdf_with_lines(&["Staff directory", "c@d.com"]);
        let text = pdf_text(&bytes).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["Staff directory", "c@d.com"]);
    }

    #[test]
    fn test_adjacent_lines_do_not_merge() {
        let bytes = pdf_with_lines(&["Staff", "c@d.com"]);
        let found = crate::extract::extract(&bytes, crate::extract::ContentKind::Pdf).unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["c@d.com"]);
    }

    #[test]
    fn test_kerning_gap_reads_as_space() {
        let mut text = String::new();
        text.push_str("write");
        space(&mut text);
        space(&mut text);
        text.push_str("to");
        line_break(&mut text);
        line_break(&mut text);
        assert_eq!(text, "write to\n");
    }

    #[test]
    fn test_utf16_strings_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, b'a', 0x00, b'@', 0x00, b'b'];
        assert_eq!(decode_string(&bytes), "a@b");
        assert_eq!(decode_string(b"plain"), "plain");
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = pdf_text(b"%PDF-1.4 this is not really a pdf");
        assert!(matches!(result, Err(ExtractionError::Pdf(_))));
    }
}
