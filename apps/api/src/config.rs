use anyhow::{ensure, Context, Result};

/// Default maximum request payload accepted by the hosted generation tier.
/// The free Gemini tier caps the total request at roughly 10k bytes; retrieval
/// breadth and schema verbosity have to fit under it.
const DEFAULT_PAYLOAD_CEILING_BYTES: usize = 10_000;

/// Default upload ceiling for resume files (5 MB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Read once at startup and treated as immutable afterwards; every component
/// receives the values it needs through its constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub request_timeout_secs: u64,
    pub payload_ceiling_bytes: usize,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            generation_model: env_or("GENERATION_MODEL", "models/gemini-1.5-flash-002"),
            embedding_model: env_or("EMBEDDING_MODEL", "models/text-embedding-004"),
            chunk_size: parse_env("CHUNK_SIZE", 1024)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 20)?,
            top_k: parse_env("TOP_K", 2)?,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30)?,
            payload_ceiling_bytes: parse_env(
                "PAYLOAD_CEILING_BYTES",
                DEFAULT_PAYLOAD_CEILING_BYTES,
            )?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        };

        ensure!(
            config.chunk_overlap < config.chunk_size,
            "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
            config.chunk_overlap,
            config.chunk_size
        );
        ensure!(config.top_k > 0, "TOP_K must be at least 1");

        Ok(config)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}
