use std::sync::Arc;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::insight::chunker::TokenWindowChunker;
use crate::llm_client::TextGenerator;
use crate::loader::ParserRegistry;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything here is read-only after startup; each extraction
/// session owns its own document, chunks, and index, so independent uploads
/// can run in parallel without sharing mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable generation backend. Production: `GeminiClient`.
    pub llm: Arc<dyn TextGenerator>,
    /// Pluggable embedding backend. Production: `GeminiEmbedding`.
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub parsers: Arc<ParserRegistry>,
    pub chunker: Arc<TokenWindowChunker>,
}
