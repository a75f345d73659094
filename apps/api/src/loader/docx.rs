//! DOCX text extraction.
//!
//! A `.docx` file is a zip archive; the body text lives in
//! `word/document.xml`. Pulling the text nodes out of that one part is all
//! the loader needs — styles, tables, and headers are out of scope.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{DocumentParser, ParserError};

pub struct DocxParser;

impl DocumentParser for DocxParser {
    fn parse(&self, bytes: &[u8]) -> Result<String, ParserError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ParserError::ParseFailure(format!("not a DOCX archive: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ParserError::ParseFailure(format!("missing word/document.xml: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| ParserError::ParseFailure(format!("unreadable document.xml: {e}")))?;

        extract_document_text(&xml)
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}

/// Walks the OOXML body and collects text runs; paragraph ends (`w:p`) and
/// tabs map to newline and space so the extracted text keeps its layout hints.
fn extract_document_text(xml: &str) -> Result<String, ParserError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let run = t
                    .unescape()
                    .map_err(|e| ParserError::ParseFailure(format!("bad text run: {e}")))?;
                text.push_str(&run);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => text.push('\n'),
            Ok(Event::Empty(e)) if e.name().as_ref() == b"w:tab" => text.push(' '),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParserError::ParseFailure(format!(
                    "invalid document.xml: {e}"
                )))
            }
        }
    }

    Ok(text)
}
