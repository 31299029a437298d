//! Turns free-text model output into an `AnalysisResult`.
//!
//! The model is asked for raw JSON but regularly wraps it in Markdown fences or
//! returns something else entirely. Parsing goes through a strict schema;
//! anything that does not fit becomes the fixed placeholder result instead of
//! an error.

use avni_common::{Activity, AnalysisResult};
use serde::Deserialize;

use crate::llm_client::strip_json_fences;

/// Outcome of normalizing one model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedAnalysis {
    Structured(AnalysisResult),
    Placeholder { reason: String },
}

impl NormalizedAnalysis {
    pub fn into_result(self) -> AnalysisResult {
        match self {
            NormalizedAnalysis::Structured(result) => result,
            NormalizedAnalysis::Placeholder { .. } => AnalysisResult::parse_failure(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, NormalizedAnalysis::Placeholder { .. })
    }
}

/// Both lists are required here; the shared wire type defaults them instead.
#[derive(Debug, Deserialize)]
struct StrictAnalysis {
    therapy_goals: Vec<String>,
    activities: Vec<StrictActivity>,
}

#[derive(Debug, Deserialize)]
struct StrictActivity {
    title: String,
    description: String,
}

pub fn normalize_model_output(raw: &str) -> NormalizedAnalysis {
    let cleaned = strip_json_fences(raw);
    match serde_json::from_str::<StrictAnalysis>(&cleaned) {
        Ok(parsed) => NormalizedAnalysis::Structured(AnalysisResult {
            therapy_goals: parsed.therapy_goals,
            activities: parsed
                .activities
                .into_iter()
                .map(|a| Activity::new(a.title, a.description))
                .collect(),
        }),
        Err(e) => NormalizedAnalysis::Placeholder {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
  "therapy_goals": ["Improve eye contact", "Build first words", "Tolerate loud sounds"],
  "activities": [
    {"title": "Mirror Play", "description": "Make faces together in a mirror."},
    {"title": "Sound Ladder", "description": "Gradually raise music volume."}
  ]
}"#;

    #[test]
    fn test_plain_json_is_structured() {
        match normalize_model_output(VALID) {
            NormalizedAnalysis::Structured(result) => {
                assert_eq!(result.therapy_goals.len(), 3);
                assert_eq!(result.activities.len(), 2);
                assert_eq!(result.activities[0].title, "Mirror Play");
            }
            other => panic!("expected structured result, got {other:?}"),
        }
    }

    #[test]
    fn test_fenced_json_parses_identically_to_unfenced() {
        let fenced = format!("```json\n{VALID}\n```");
        let bare_fence = format!("```\n{VALID}\n```");
        let expected = normalize_model_output(VALID);

        assert_eq!(normalize_model_output(&fenced), expected);
        assert_eq!(normalize_model_output(&bare_fence), expected);
    }

    #[test]
    fn test_prose_becomes_placeholder() {
        let outcome = normalize_model_output("I'm sorry, I can't help with that.");
        assert!(outcome.is_placeholder());
        assert_eq!(outcome.into_result(), AnalysisResult::parse_failure());
    }

    #[test]
    fn test_missing_list_becomes_placeholder() {
        let outcome = normalize_model_output(r#"{"therapy_goals": ["Only goals"]}"#);
        assert!(outcome.is_placeholder());
    }

    #[test]
    fn test_activity_without_description_becomes_placeholder() {
        let outcome = normalize_model_output(
            r#"{"therapy_goals": [], "activities": [{"title": "Untitled only"}]}"#,
        );
        assert!(outcome.is_placeholder());
    }

    #[test]
    fn test_extra_keys_are_tolerated() {
        let outcome = normalize_model_output(
            r#"{"therapy_goals": ["a"], "activities": [], "confidence": "high"}"#,
        );
        assert_eq!(
            outcome.into_result(),
            AnalysisResult {
                therapy_goals: vec!["a".to_string()],
                activities: vec![],
            }
        );
    }

    #[test]
    fn test_result_always_has_both_lists() {
        for raw in ["", "null", "[]", "{\"therapy_goals\": null}", VALID] {
            let result = normalize_model_output(raw).into_result();
            let json = serde_json::to_value(&result).unwrap();
            assert!(json["therapy_goals"].is_array(), "goals missing for {raw:?}");
            assert!(json["activities"].is_array(), "activities missing for {raw:?}");
        }
    }
}
