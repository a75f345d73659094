//! Structured Validator — turns raw model output into a typed record.
//!
//! Policy: permissive per field, strict per document. The one enforceable
//! precondition on generative output is "the whole thing is JSON"; a field
//! that is missing or mistyped is recorded as "not extracted" (null) rather
//! than failing the session, because a mostly-filled record beats a hard
//! failure on one bad field.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::insight::schema::{FieldType, RecordSchema};
use crate::models::{Candidate, JobSkillReport};

#[derive(Debug, Error)]
pub enum ValidateError {
    /// The output was not parsable JSON at all. Carries the raw text so the
    /// failure can be diagnosed from logs.
    #[error("model output is not valid JSON ({reason}): {raw:?}")]
    MalformedModelOutput { raw: String, reason: String },

    /// The output parsed but its top-level shape cannot be coerced into the
    /// requested record.
    #[error("model output does not match the '{schema}' record: {reason}")]
    SchemaMismatch {
        schema: &'static str,
        reason: String,
    },
}

/// Validates raw model output against `schema`, yielding a JSON object in
/// which every declared field is either well-typed or null. Idempotent:
/// feeding the output back through produces the same value.
pub fn validate(raw: &str, schema: &RecordSchema) -> Result<Value, ValidateError> {
    let stripped = strip_json_fences(raw);

    let parsed: Value =
        serde_json::from_str(stripped).map_err(|e| ValidateError::MalformedModelOutput {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

    let object = match parsed {
        Value::Object(map) => map,
        other => {
            return Err(ValidateError::SchemaMismatch {
                schema: schema.name,
                reason: format!("expected a JSON object, got {}", type_name(&other)),
            })
        }
    };

    let mut coerced = Map::new();
    for field in &schema.fields {
        let value = object.get(field.name).cloned().unwrap_or(Value::Null);
        coerced.insert(field.name.to_string(), coerce_field(value, field.ty));
    }

    Ok(Value::Object(coerced))
}

/// Validates raw model output into a `Candidate`.
pub fn validate_candidate(raw: &str, schema: &RecordSchema) -> Result<Candidate, ValidateError> {
    let value = validate(raw, schema)?;
    serde_json::from_value(value).map_err(|e| ValidateError::SchemaMismatch {
        schema: schema.name,
        reason: e.to_string(),
    })
}

/// Validates raw model output into a `JobSkillReport`.
pub fn validate_job_skills(
    raw: &str,
    schema: &RecordSchema,
) -> Result<JobSkillReport, ValidateError> {
    let value = validate(raw, schema)?;
    serde_json::from_value(value).map_err(|e| ValidateError::SchemaMismatch {
        schema: schema.name,
        reason: e.to_string(),
    })
}

/// Coerces one field value: well-typed values pass through, everything else
/// becomes null ("not extracted").
fn coerce_field(value: Value, ty: FieldType) -> Value {
    match ty {
        FieldType::String => match value {
            Value::String(s) => Value::String(s),
            _ => Value::Null,
        },
        FieldType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Value::Number(n),
            _ => Value::Null,
        },
        FieldType::StringArray => match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .filter(|item| item.is_string())
                    .collect(),
            ),
            _ => Value::Null,
        },
        FieldType::AssessmentMap => match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(skill, assessment)| (skill, coerce_assessment(assessment)))
                    .collect(),
            ),
            _ => Value::Null,
        },
    }
}

/// Coerces one per-skill assessment; the skill key is kept even when every
/// field inside is unusable.
fn coerce_assessment(value: Value) -> Value {
    let object = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut coerced = Map::new();
    coerced.insert(
        "relevance".to_string(),
        coerce_field(
            object.get("relevance").cloned().unwrap_or(Value::Null),
            FieldType::String,
        ),
    );
    coerced.insert(
        "reasoning".to_string(),
        coerce_field(
            object.get("reasoning").cloned().unwrap_or(Value::Null),
            FieldType::String,
        ),
    );
    let proficiency = coerce_field(
        object.get("proficiency").cloned().unwrap_or(Value::Null),
        FieldType::Integer,
    );
    // Proficiency is a 0-100 scale; anything outside it is unusable.
    let proficiency = match proficiency.as_u64() {
        Some(p) if p <= 100 => proficiency,
        _ => Value::Null,
    };
    coerced.insert("proficiency".to_string(), proficiency);

    Value::Object(coerced)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
/// The prompt already forbids fences, but models are non-deterministic and
/// ignore instructions often enough that stripping defensively is required.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
