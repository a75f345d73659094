//! Schema descriptions for schema-guided queries.
//!
//! Each target record type has a static builder producing a canonical,
//! stable description of its shape. The same description drives both the
//! prompt text (so the model knows what to emit) and the tolerant decoder
//! (so per-field type enforcement matches what was asked for).

use serde_json::{json, Value};

/// Primitive shape of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    StringArray,
    /// Mapping from skill name to a `SkillAssessment`-shaped object.
    AssessmentMap,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical JSON description embedded into prompts. `serde_json` keeps
    /// object keys sorted, so the rendering is stable across runs.
    pub fn to_prompt_json(&self) -> String {
        let properties: Value = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), field_description(f)))
            .collect::<serde_json::Map<String, Value>>()
            .into();

        let schema = json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
        });

        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }
}

fn field_description(field: &FieldSpec) -> Value {
    match field.ty {
        FieldType::String => json!({
            "type": "string",
            "description": field.description,
        }),
        FieldType::Integer => json!({
            "type": "integer",
            "description": field.description,
        }),
        FieldType::StringArray => json!({
            "type": "array",
            "items": {"type": "string"},
            "description": field.description,
        }),
        FieldType::AssessmentMap => json!({
            "type": "object",
            "description": field.description,
            "additionalProperties": {
                "type": "object",
                "properties": {
                    "relevance": {
                        "type": "string",
                        "description": "How relevant the skill is to the job position"
                    },
                    "reasoning": {
                        "type": "string",
                        "description": "Why this skill is relevant to the job position"
                    },
                    "proficiency": {
                        "type": "integer",
                        "description": "Proficiency level from 0 to 100 based on years of use"
                    }
                }
            },
        }),
    }
}

/// Schema for the `Candidate` record. `contact` is deliberately a string:
/// phone numbers carry symbols and leading zeros that integer typing loses.
pub fn candidate_schema() -> RecordSchema {
    RecordSchema {
        name: "Candidate",
        fields: vec![
            FieldSpec {
                name: "name",
                ty: FieldType::String,
                description: "The full name of the candidate",
            },
            FieldSpec {
                name: "contact",
                ty: FieldType::String,
                description: "The contact number of the candidate, exactly as written",
            },
            FieldSpec {
                name: "email",
                ty: FieldType::String,
                description: "The email of the candidate",
            },
            FieldSpec {
                name: "location",
                ty: FieldType::String,
                description: "The location of the candidate",
            },
            FieldSpec {
                name: "skills",
                ty: FieldType::StringArray,
                description: "A list of skills possessed by the candidate",
            },
            FieldSpec {
                name: "experience",
                ty: FieldType::String,
                description: "Experience of the candidate",
            },
            FieldSpec {
                name: "summary",
                ty: FieldType::String,
                description: "Summary of the resume",
            },
        ],
    }
}

/// Schema for the `JobSkillReport` record.
pub fn job_skill_schema() -> RecordSchema {
    RecordSchema {
        name: "JobSkillReport",
        fields: vec![
            FieldSpec {
                name: "jobName",
                ty: FieldType::String,
                description: "Job position name",
            },
            FieldSpec {
                name: "skills",
                ty: FieldType::AssessmentMap,
                description: "One relevance assessment per evaluated skill, keyed by skill name",
            },
        ],
    }
}
