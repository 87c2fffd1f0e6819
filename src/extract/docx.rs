//! DOCX text extraction.
//!
//! A DOCX file is a zip container; the body lives in `word/document.xml`.
//! Paragraph text is the concatenation of its runs, with run-level tabs and
//! breaks kept as whitespace. Text boxes (`w:txbxContent`) are anchored
//! inside runs and are left out, so they never split the paragraph around
//! them.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::extractor::ExtractionError;

const DOCUMENT_XML: &str = "word/document.xml";
const TEXT_BOX: &[u8] = b"w:txbxContent";

/// Extract paragraph text from DOCX bytes, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a zip container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| ExtractionError::Docx(format!("missing {}: {}", DOCUMENT_XML, e)))?
        .read_to_string(&mut xml)?;

    let paragraphs = parse_paragraphs(&xml)?;
    Ok(paragraphs.join("\n"))
}

fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;
    // Depth of nested text boxes being skipped.
    let mut skipped = 0usize;

    loop {
        if skipped > 0 {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.name().as_ref() == TEXT_BOX => skipped += 1,
                Ok(Event::End(ref e)) if e.name().as_ref() == TEXT_BOX => skipped -= 1,
                Ok(Event::Eof) => break,
                Err(e) => return Err(malformed(&reader, e)),
                _ => {}
            }
            buf.clear();
            continue;
        }

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == TEXT_BOX => skipped = 1,
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" if in_run => current.push('\t'),
                b"w:br" | b"w:cr" if in_run => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ExtractionError::Docx(err.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn malformed(reader: &Reader<&[u8]>, e: quick_xml::Error) -> ExtractionError {
    ExtractionError::Docx(format!(
        "malformed document.xml at byte {}: {}",
        reader.buffer_position(),
        e
    ))
}
