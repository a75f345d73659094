//! PDF text extraction via `pdf-extract`.

use std::io::Write;

use super::{DocumentParser, ParserError};

/// Extracts text from PDF bytes through a scoped temporary file.
///
/// The backend reads from a path, so the bytes are spilled to a
/// `NamedTempFile`; the file is removed on drop, on every exit path.
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<String, ParserError> {
        let mut temp_file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ParserError::ParseFailure(format!("temp file: {e}")))?;

        temp_file
            .write_all(bytes)
            .map_err(|e| ParserError::ParseFailure(format!("temp file write: {e}")))?;

        pdf_extract::extract_text(temp_file.path())
            .map_err(|e| ParserError::ParseFailure(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}
