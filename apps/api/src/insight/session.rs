//! Extraction session — one uploaded resume, one pipeline run.
//!
//! Linear lifecycle: Uploaded -> Loaded -> Indexed -> Queried -> Validated.
//! There are no backward transitions; any failure carries its originating
//! stage (`AppError::stage`) and the session is dropped, so a caller
//! restarts by re-uploading. Sessions own all of their state and share
//! nothing with each other beyond read-only config and clients, which is
//! what lets independent uploads run in parallel.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::insight::chunker::TokenWindowChunker;
use crate::insight::index::VectorIndex;
use crate::insight::prompts::CANDIDATE_EXTRACTION_INSTRUCTION;
use crate::insight::query_engine::SchemaQueryEngine;
use crate::insight::schema::candidate_schema;
use crate::insight::skill_matcher;
use crate::insight::validator::validate_candidate;
use crate::llm_client::TextGenerator;
use crate::loader::{Document, ParserError, ParserRegistry};
use crate::models::{Candidate, JobSkillReport};

/// One extraction session: a loaded document plus its query engine.
pub struct ResumeInsights {
    document: Document,
    engine: SchemaQueryEngine,
}

/// Everything a session borrows from process-wide state. All read-only.
pub struct SessionDeps<'a> {
    pub parsers: &'a ParserRegistry,
    pub chunker: &'a TokenWindowChunker,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub top_k: usize,
    pub payload_ceiling_bytes: usize,
}

impl ResumeInsights {
    /// Loads, chunks, and indexes an uploaded file. The parser registry is
    /// consulted before anything touches the network, so an unsupported
    /// extension never costs a backend call.
    pub async fn from_upload(
        bytes: &[u8],
        extension: &str,
        source: &str,
        deps: SessionDeps<'_>,
    ) -> Result<Self, AppError> {
        let document = deps
            .parsers
            .load(bytes, extension, source)
            .map_err(|e| match e {
                ParserError::UnsupportedFormat(ext) => AppError::UnsupportedFormat(format!(
                    "no parser registered for extension '.{ext}'"
                )),
                ParserError::ParseFailure(msg) => AppError::ParseFailure(msg),
            })?;

        Self::from_document(document, deps).await
    }

    /// Builds a session from already-extracted resume text. Used by the
    /// skill-match endpoint, which receives the text a prior extraction
    /// returned instead of re-uploading the file.
    pub async fn from_text(
        text: &str,
        source: &str,
        deps: SessionDeps<'_>,
    ) -> Result<Self, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::ParseFailure(
                "resume text is empty".to_string(),
            ));
        }
        Self::from_document(Document::new(source, text), deps).await
    }

    async fn from_document(
        document: Document,
        deps: SessionDeps<'_>,
    ) -> Result<Self, AppError> {
        let chunks = deps.chunker.chunk(&document.text);
        let index = VectorIndex::build(chunks, deps.embedder).await?;

        info!(
            document = %document.id,
            source = %document.source,
            chunks = index.len(),
            "extraction session indexed"
        );

        let engine = SchemaQueryEngine::new(
            index,
            deps.generator,
            deps.top_k,
            deps.payload_ceiling_bytes,
        );

        Ok(Self { document, engine })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Extracts the structured candidate record from the resume.
    pub async fn extract_candidate(&self) -> Result<Candidate, AppError> {
        let schema = candidate_schema();
        let raw = self
            .engine
            .query(CANDIDATE_EXTRACTION_INSTRUCTION, &schema)
            .await?;
        let candidate = validate_candidate(&raw, &schema)?;

        info!(
            document = %self.document.id,
            has_name = candidate.name.is_some(),
            skill_count = candidate.skills.as_ref().map_or(0, Vec::len),
            "candidate record extracted"
        );

        Ok(candidate)
    }

    /// Scores the given skills against a job position. Callers pre-truncate
    /// oversized skill lists (see the handler's cap).
    pub async fn match_job_to_skills(
        &self,
        skills: &[String],
        job_title: &str,
        company: &str,
    ) -> Result<JobSkillReport, AppError> {
        skill_matcher::match_job_to_skills(&self.engine, skills, job_title, company).await
    }
}

impl fmt::Debug for ResumeInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeInsights")
            .field("document", &self.document.id)
            .field("source", &self.document.source)
            .field("engine", &self.engine)
            .finish()
    }
}
