/// LLM Client — the single point of entry for all generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything that needs generated text goes through `TextGenerator`.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Total attempts per call: the first try plus one retry on transient failures.
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("authentication rejected (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("request payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("generation API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

impl GenerationError {
    /// Transient failures are worth one retry; schema, auth, and payload
    /// failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Http(_) | GenerationError::Timeout => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// Pluggable generation backend. The query engine only ever sees this trait,
/// so tests swap in canned generators and no test touches the network.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one prompt and returns the model's raw text response verbatim.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Gemini `generateContent` client. One blocking (non-streaming) request per
/// call, bounded by the configured timeout, with a single retry on transient
/// network failures.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
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
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }

    async fn call_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
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
            return Err(classify_status(status.as_u16(), message));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(classify_transport_error)?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            return Err(GenerationError::EmptyContent);
        }

        debug!(
            model = %self.model,
            response_bytes = text.len(),
            "generation call succeeded"
        );

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, ...
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "generation attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.call_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GenerationError::RateLimited {
            attempts: MAX_ATTEMPTS,
        }))
    }
}

fn classify_transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Http(e)
    }
}

fn classify_status(status: u16, message: String) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Auth { status, message },
        413 => GenerationError::PayloadTooLarge(message),
        _ => GenerationError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_are_not_transient() {
        let err = classify_status(401, "bad key".to_string());
        assert!(matches!(err, GenerationError::Auth { status: 401, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_payload_too_large_is_not_transient() {
        let err = classify_status(413, "too big".to_string());
        assert!(matches!(err, GenerationError::PayloadTooLarge(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_transient() {
        assert!(classify_status(429, String::new()).is_transient());
        assert!(classify_status(503, String::new()).is_transient());
    }

    #[test]
    fn test_client_errors_other_than_auth_are_terminal() {
        let err = classify_status(400, "invalid argument".to_string());
        assert!(matches!(err, GenerationError::Api { status: 400, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"name\":"}, {"text": " \"Jane\"}"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, r#"{"name": "Jane"}"#);
    }

    #[test]
    fn test_empty_candidate_list_deserializes() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
