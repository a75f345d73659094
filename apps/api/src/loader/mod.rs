//! Document Loader — turns raw uploaded bytes into text `Document`s.
//!
//! Parsers are pluggable and keyed by file extension; nothing here touches
//! the network, so an unsupported extension fails before any backend call.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

pub mod docx;
pub mod pdf;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("no parser registered for extension '.{0}'")]
    UnsupportedFormat(String),

    #[error("failed to parse document: {0}")]
    ParseFailure(String),
}

/// One loaded document: the full extracted text plus source metadata.
/// Lives only for the duration of a single extraction session.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Pluggable backend parser: bytes in, extracted text out.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<String, ParserError>;

    fn name(&self) -> &'static str;
}

/// Extracts plain UTF-8 text. Invalid sequences are replaced, not rejected;
/// a text file is never the document that should fail the pipeline.
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse(&self, bytes: &[u8]) -> Result<String, ParserError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn name(&self) -> &'static str {
        "plaintext"
    }
}

/// Registry of parsers keyed by lowercase file extension (no leading dot).
pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry covering the supported upload formats: PDF, DOCX, plaintext.
    pub fn with_default_parsers() -> Self {
        let mut registry = Self::new();
        registry.register("pdf", Box::new(pdf::PdfParser));
        registry.register("docx", Box::new(docx::DocxParser));
        registry.register("txt", Box::new(PlainTextParser));
        registry
    }

    pub fn register(&mut self, extension: &str, parser: Box<dyn DocumentParser>) {
        self.parsers
            .insert(normalize_extension(extension), parser);
    }

    /// Parses `bytes` with the parser registered for `extension` and wraps
    /// the result in a `Document`. A document with no extractable text (for
    /// example a scanned-image-only PDF) is a parse failure, not an empty
    /// success.
    pub fn load(
        &self,
        bytes: &[u8],
        extension: &str,
        source: &str,
    ) -> Result<Document, ParserError> {
        let ext = normalize_extension(extension);
        let parser = self
            .parsers
            .get(&ext)
            .ok_or_else(|| ParserError::UnsupportedFormat(ext.clone()))?;

        let text = parser.parse(bytes)?;
        if text.trim().is_empty() {
            return Err(ParserError::ParseFailure(format!(
                "'{source}' contains no extractable text"
            )));
        }

        tracing::debug!(
            source,
            parser = parser.name(),
            bytes = bytes.len(),
            chars = text.len(),
            "document loaded"
        );

        Ok(Document::new(source, text))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}
