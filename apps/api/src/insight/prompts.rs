//! Prompt templates for the extraction pipeline. Each query pairs an
//! instruction from here with a schema from `schema.rs`; the query engine
//! appends the shared JSON-only directive.

/// Directive appended to every schema-guided prompt. The validator still
/// strips fences defensively; models ignore instructions often enough.
pub const JSON_ONLY_DIRECTIVE: &str = "Provide the result as a single raw JSON object \
    matching the schema. Do NOT use markdown code fences. Do NOT include any text \
    outside the JSON object. Use null for any property the context does not support.";

/// Instruction for extracting the structured candidate record.
pub const CANDIDATE_EXTRACTION_INSTRUCTION: &str = "Extract the candidate's details \
    from the resume: their full name, contact number, email address, location, the \
    list of skills they possess, a description of their experience, and a short \
    summary of the resume.";

/// Builds the batched skill-relevance instruction: one reasoning sub-task
/// per skill, all in a single request. Callers must pre-truncate oversized
/// skill lists; this function does not enforce the payload ceiling.
pub fn skill_match_instruction(skills: &[String], job_title: &str, company: &str) -> String {
    let sub_tasks: Vec<String> = skills
        .iter()
        .map(|skill| {
            format!(
                "Given this skill: {skill}, explain whether and why it matters to the \
                 following job position: {job_title} at {company}. If the skill is not \
                 relevant, say so."
            )
        })
        .collect();

    format!(
        "{}\nAssess every skill above independently and report each one under its own \
         key in the output.",
        sub_tasks.join("\n")
    )
}
