use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::insight::session::{ResumeInsights, SessionDeps};
use crate::models::{Candidate, JobSkillReport};
use crate::state::AppState;

/// Upstream cap carried over from the original UI: beyond ~20 skills the
/// batched relevance prompt outgrows the hosted tier's payload ceiling.
const MAX_SKILLS_PER_MATCH: usize = 20;

#[derive(Serialize)]
pub struct ExtractResponse {
    pub candidate: Candidate,
    /// Extracted resume text, echoed back so the stateless skill-match
    /// endpoint can rebuild its index without a re-upload.
    pub resume_text: String,
}

#[derive(Deserialize)]
pub struct SkillMatchRequest {
    pub resume_text: String,
    pub skills: Vec<String>,
    pub job_title: String,
    pub company: String,
}

fn session_deps(state: &AppState) -> SessionDeps<'_> {
    SessionDeps {
        parsers: &*state.parsers,
        chunker: &*state.chunker,
        embedder: state.embedder.clone(),
        generator: state.llm.clone(),
        top_k: state.config.top_k,
        payload_ceiling_bytes: state.config.payload_ceiling_bytes,
    }
}

/// POST /api/v1/insights
/// Multipart upload (`file` part) -> extracted candidate record.
pub async fn handle_extract_insights(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let mut upload: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .ok_or_else(|| {
                    AppError::Validation("file part is missing a filename".to_string())
                })?
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            upload = Some((file_name, bytes));
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("missing 'file' part".to_string()))?;

    if bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "file is {} bytes, upload ceiling is {}",
            bytes.len(),
            state.config.max_upload_bytes
        )));
    }

    let extension = file_name.rsplit('.').next().filter(|e| *e != file_name);
    let extension = extension.ok_or_else(|| {
        AppError::UnsupportedFormat(format!("'{file_name}' has no file extension"))
    })?;

    let session =
        ResumeInsights::from_upload(&bytes, extension, &file_name, session_deps(&state)).await?;
    let candidate = session.extract_candidate().await?;

    Ok(Json(ExtractResponse {
        resume_text: session.document().text.clone(),
        candidate,
    }))
}

/// POST /api/v1/insights/skills/match
/// Scores a skill list against a job position, reusing previously extracted
/// resume text as retrieval context.
pub async fn handle_match_skills(
    State(state): State<AppState>,
    Json(req): Json<SkillMatchRequest>,
) -> Result<Json<JobSkillReport>, AppError> {
    if req.skills.is_empty() {
        return Err(AppError::Validation(
            "at least one skill is required".to_string(),
        ));
    }
    if req.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }

    // Pre-truncate before the matcher, which documents but does not enforce
    // the payload precondition.
    let skills: Vec<String> = req
        .skills
        .into_iter()
        .take(MAX_SKILLS_PER_MATCH)
        .collect();

    let session =
        ResumeInsights::from_text(&req.resume_text, "skill-match", session_deps(&state)).await?;
    let report = session
        .match_job_to_skills(&skills, &req.job_title, &req.company)
        .await?;

    Ok(Json(report))
}
