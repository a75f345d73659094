//! Relevance Scorer — batched per-skill relevance judgments for one job.
//!
//! One compound instruction covers every skill in a single request, which
//! amortizes request overhead and stays inside the hosted tier's rate
//! limits. Documented precondition: the caller pre-truncates the skill list
//! so the assembled prompt fits the payload ceiling; the handler applies
//! the upstream cap of 20 skills.

use tracing::info;

use crate::errors::AppError;
use crate::insight::prompts::skill_match_instruction;
use crate::insight::query_engine::SchemaQueryEngine;
use crate::insight::schema::job_skill_schema;
use crate::insight::validator::validate_job_skills;
use crate::models::JobSkillReport;

pub async fn match_job_to_skills(
    engine: &SchemaQueryEngine,
    skills: &[String],
    job_title: &str,
    company: &str,
) -> Result<JobSkillReport, AppError> {
    let schema = job_skill_schema();
    let instruction = skill_match_instruction(skills, job_title, company);

    let raw = engine.query(&instruction, &schema).await?;
    let mut report = validate_job_skills(&raw, &schema)?;

    // The job name is already known from the request; a model that omits it
    // should not degrade the report.
    report.job_name.get_or_insert_with(|| job_title.to_string());

    info!(
        job = job_title,
        requested = skills.len(),
        assessed = report.skills.len(),
        "skill relevance report built"
    );

    Ok(report)
}
