//! Embedding backend — turns text into vectors for the per-session index.
//!
//! Mirrors the generation client: Gemini behind a narrow trait, so the index
//! can be built and queried against mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// First try plus one retry on transient failures.
const MAX_ATTEMPTS: u32 = 2;

/// Output dimension of `text-embedding-004`.
pub const DEFAULT_DIMENSION: usize = 768;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding input rejected by backend: {0}")]
    InputRejected(String),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("backend returned a {actual}-dimensional vector, provider promises {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Http(_) | EmbeddingError::Timeout => true,
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// Pluggable embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `embedContent` client.
#[derive(Clone)]
pub struct GeminiEmbedding {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiEmbedding {
    pub fn new(api_key: String, model: String, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:embedContent", self.model)
    }

    async fn call_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request_body = EmbedRequest {
            model: &self.model,
            content: EmbedContent {
                parts: vec![EmbedPart { text }],
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            // 400 INVALID_ARGUMENT is how the backend reports input over its
            // own size limit; surface it instead of truncating.
            return Err(match status.as_u16() {
                400 | 413 => EmbeddingError::InputRejected(message),
                s => EmbeddingError::Api { status: s, message },
            });
        }

        let parsed: EmbedResponse = response.json().await.map_err(classify_transport_error)?;

        debug!(
            model = %self.model,
            dimension = parsed.embedding.values.len(),
            "embedding call succeeded"
        );

        Ok(parsed.embedding.values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "embedding attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.call_once(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(EmbeddingError::RateLimited {
            attempts: MAX_ATTEMPTS,
        }))
    }

    fn dimension(&self) -> usize {
        DEFAULT_DIMENSION
    }
}

fn classify_transport_error(e: reqwest::Error) -> EmbeddingError {
    if e.is_timeout() {
        EmbeddingError::Timeout
    } else {
        EmbeddingError::Http(e)
    }
}
