//! Schema-Guided Query Engine — retrieval-augmented, schema-constrained
//! generation over one document's index.
//!
//! The engine retrieves the most relevant chunks, assembles the augmented
//! prompt (context + instruction + schema + raw-JSON directive), preflights
//! the payload ceiling, and makes exactly one generation call. It never
//! interprets the response; that is the validator's job.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::AppError;
use crate::insight::index::VectorIndex;
use crate::insight::prompts::JSON_ONLY_DIRECTIVE;
use crate::insight::schema::RecordSchema;
use crate::llm_client::{GenerationError, TextGenerator};

pub struct SchemaQueryEngine {
    index: VectorIndex,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    payload_ceiling_bytes: usize,
}

impl SchemaQueryEngine {
    pub fn new(
        index: VectorIndex,
        generator: Arc<dyn TextGenerator>,
        top_k: usize,
        payload_ceiling_bytes: usize,
    ) -> Self {
        Self {
            index,
            generator,
            top_k,
            payload_ceiling_bytes,
        }
    }

    /// Runs one schema-guided query and returns the model's raw text
    /// verbatim.
    pub async fn query(
        &self,
        instruction: &str,
        schema: &RecordSchema,
    ) -> Result<String, AppError> {
        let retrieved = self.index.query(instruction, self.top_k).await?;
        let context: Vec<&str> = retrieved.iter().map(|r| r.chunk.text.as_str()).collect();

        let prompt = assemble_prompt(&context, instruction, schema);

        debug!(
            schema = schema.name,
            retrieved = retrieved.len(),
            prompt_bytes = prompt.len(),
            "schema-guided query assembled"
        );

        // Preflight: the hosted tier rejects oversized payloads at call time
        // with an opaque error, so fail locally with an actionable one. The
        // fix is configuration (smaller TOP_K, leaner schema), not retry.
        if prompt.len() > self.payload_ceiling_bytes {
            return Err(GenerationError::PayloadTooLarge(format!(
                "assembled prompt is {} bytes, configured ceiling is {} \
                 (reduce TOP_K or schema verbosity)",
                prompt.len(),
                self.payload_ceiling_bytes
            ))
            .into());
        }

        let raw = self.generator.generate(&prompt).await?;
        Ok(raw)
    }
}

// The generator is a trait object, so Debug is written out by hand.
impl fmt::Debug for SchemaQueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaQueryEngine")
            .field("indexed_chunks", &self.index.len())
            .field("top_k", &self.top_k)
            .field("payload_ceiling_bytes", &self.payload_ceiling_bytes)
            .finish_non_exhaustive()
    }
}

fn assemble_prompt(context: &[&str], instruction: &str, schema: &RecordSchema) -> String {
    format!(
        "Context information from the candidate's resume is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Using ONLY the context information above, complete the following task.\n\n\
         TASK:\n{}\n\n\
         Use the following JSON schema describing the information to extract:\n\
         {}\n\n\
         {}",
        context.join("\n---\n"),
        instruction,
        schema.to_prompt_json(),
        JSON_ONLY_DIRECTIVE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingError, EmbeddingProvider};
    use crate::insight::chunker::Chunk;
    use crate::insight::schema::candidate_schema;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ConstantEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ConstantEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct CannedGenerator {
        response: String,
        calls: AtomicUsize,
    }

    impl CannedGenerator {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    struct PromptCapturingGenerator {
        seen: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for PromptCapturingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            Ok("{}".to_string())
        }
    }

    async fn index_of(texts: &[&str]) -> VectorIndex {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk {
                index: i,
                text: t.to_string(),
                start: 0,
                end: t.len(),
            })
            .collect();
        VectorIndex::build(chunks, Arc::new(ConstantEmbedder))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_returns_generator_output_verbatim() {
        let index = index_of(&["chunk one"]).await;
        let generator = CannedGenerator::new("```json\n{\"name\": \"Jane\"}\n```");
        let engine = SchemaQueryEngine::new(index, generator.clone(), 1, 100_000);

        let raw = engine
            .query("Extract the candidate", &candidate_schema())
            .await
            .unwrap();
        // No interpretation, no fence stripping here.
        assert_eq!(raw, "```json\n{\"name\": \"Jane\"}\n```");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_context_instruction_and_schema() {
        let index = index_of(&["Jane Doe worked at Initech"]).await;
        let generator = Arc::new(PromptCapturingGenerator {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let engine = SchemaQueryEngine::new(index, generator.clone(), 1, 100_000);

        engine
            .query("Extract the candidate details", &candidate_schema())
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let prompt = &seen[0];
        assert!(prompt.contains("Jane Doe worked at Initech"));
        assert!(prompt.contains("Extract the candidate details"));
        assert!(prompt.contains("\"title\": \"Candidate\""));
        assert!(prompt.contains(JSON_ONLY_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_payload_ceiling_fails_before_generation() {
        let index = index_of(&["some resume text that pads out the context"]).await;
        let generator = CannedGenerator::new("{}");
        // Ceiling far below any assembled prompt.
        let engine = SchemaQueryEngine::new(index, generator.clone(), 1, 64);

        let err = engine
            .query("Extract the candidate", &candidate_schema())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Generation(GenerationError::PayloadTooLarge(_))
        ));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_k_bounds_retrieved_context() {
        let index = index_of(&["alpha", "beta", "gamma"]).await;
        let generator = Arc::new(PromptCapturingGenerator {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let engine = SchemaQueryEngine::new(index, generator.clone(), 2, 100_000);

        engine.query("task", &candidate_schema()).await.unwrap();

        let seen = generator.seen.lock().unwrap();
        // All embeddings tie, so retrieval keeps document order: alpha, beta.
        assert!(seen[0].contains("alpha"));
        assert!(seen[0].contains("beta"));
        assert!(!seen[0].contains("gamma"));
    }
}
