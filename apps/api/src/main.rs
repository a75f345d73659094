mod config;
mod embedding;
mod errors;
mod insight;
mod llm_client;
mod loader;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::GeminiEmbedding;
use crate::insight::chunker::{ChunkerConfig, TokenWindowChunker};
use crate::llm_client::GeminiClient;
use crate::loader::ParserRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Insights API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.request_timeout_secs);

    // Initialize generation client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.generation_model.clone(),
        timeout,
    );
    info!("Generation client initialized (model: {})", config.generation_model);

    // Initialize embedding client
    let embedder = GeminiEmbedding::new(
        config.gemini_api_key.clone(),
        config.embedding_model.clone(),
        timeout,
    );
    info!("Embedding client initialized (model: {})", config.embedding_model);

    // Document parsers: PDF, DOCX, plaintext
    let parsers = ParserRegistry::with_default_parsers();

    // Chunking parameters are validated once here; sessions reuse them.
    let chunker = TokenWindowChunker::new(ChunkerConfig {
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
    })?;
    info!(
        "Chunker configured (size: {}, overlap: {}, top_k: {})",
        config.chunk_size, config.chunk_overlap, config.top_k
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm: Arc::new(llm),
        embedder: Arc::new(embedder),
        parsers: Arc::new(parsers),
        chunker: Arc::new(chunker),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
