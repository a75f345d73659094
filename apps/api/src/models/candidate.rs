use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Structured candidate record extracted from one resume.
///
/// Every field is optional: extraction confidence varies per field, and an
/// absent field means "not found in the document", not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The full name of the candidate.
    pub name: Option<String>,
    /// The contact number of the candidate. Kept as a string: phone numbers
    /// carry symbols and leading zeros that numeric typing would destroy.
    pub contact: Option<String>,
    /// The email of the candidate.
    pub email: Option<String>,
    /// The location of the candidate.
    pub location: Option<String>,
    /// A list of skills possessed by the candidate.
    pub skills: Option<Vec<String>>,
    /// Free-text description of the candidate's experience.
    pub experience: Option<String>,
    /// Summary of the resume.
    pub summary: Option<String>,
}

/// Relevance judgment for a single skill against one job position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillAssessment {
    /// How relevant the skill is to the job position.
    pub relevance: Option<String>,
    /// Why the skill is (or is not) relevant.
    pub reasoning: Option<String>,
    /// Proficiency level 0-100. Not yet populated by the pipeline.
    pub proficiency: Option<u8>,
}

/// Per-skill relevance report for one job position.
///
/// `skills` is a `BTreeMap` so callers iterate in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSkillReport {
    #[serde(rename = "jobName")]
    pub job_name: Option<String>,
    /// A model that omits the skill map yields an empty report, not a
    /// failure; the tolerant decoder records the omission as null.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub skills: BTreeMap<String, SkillAssessment>,
}

fn null_as_empty_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, SkillAssessment>, D::Error>
where
    D: Deserializer<'de>,
{
    let skills = Option::deserialize(deserializer)?;
    Ok(skills.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_all_fields_default_to_none() {
        let candidate = Candidate::default();
        assert!(candidate.name.is_none());
        assert!(candidate.contact.is_none());
        assert!(candidate.skills.is_none());
    }

    #[test]
    fn test_candidate_deserializes_with_missing_fields() {
        let candidate: Candidate =
            serde_json::from_str(r#"{"name": "Jane Doe"}"#).unwrap();
        assert_eq!(candidate.name.as_deref(), Some("Jane Doe"));
        assert!(candidate.email.is_none());
    }

    #[test]
    fn test_job_skill_report_uses_job_name_rename() {
        let report = JobSkillReport {
            job_name: Some("Data Engineer".to_string()),
            skills: BTreeMap::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("jobName").is_some());
        assert!(json.get("job_name").is_none());
    }

    #[test]
    fn test_null_skill_map_deserializes_as_empty() {
        let report: JobSkillReport =
            serde_json::from_str(r#"{"jobName": "Data Engineer", "skills": null}"#).unwrap();
        assert!(report.skills.is_empty());

        let report: JobSkillReport =
            serde_json::from_str(r#"{"jobName": "Data Engineer"}"#).unwrap();
        assert!(report.skills.is_empty());
    }

    #[test]
    fn test_skill_map_iterates_in_key_order() {
        let json = r#"{
            "jobName": "Data Engineer",
            "skills": {
                "Python": {"relevance": "high", "reasoning": "core tooling"},
                "Cooking": {"relevance": "none", "reasoning": "unrelated"}
            }
        }"#;
        let report: JobSkillReport = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = report.skills.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Cooking", "Python"]);
    }
}
