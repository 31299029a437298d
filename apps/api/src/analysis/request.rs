//! Lenient reading of the `/api/analyze` body.
//!
//! Clients send a superset of fields and have historically used several names
//! for the child and guardian. Only the attributes the prompt needs are
//! required; everything else is kept verbatim in the persisted record.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;

const CHILD_NAME_KEYS: &[&str] = &["childName", "ChildName", "studentName"];
const GUARDIAN_NAME_KEYS: &[&str] = &["guardianName", "ParentsName", "parentsName", "fatherName"];

/// The attributes extracted from a submission body.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeFields {
    pub child_name: Option<String>,
    pub guardian_name: Option<String>,
    pub age: String,
    pub eye_contact: String,
    pub speech_level: String,
    pub social_response: String,
    pub sensory_reactions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequiredFields {
    age: Scalar,
    eye_contact: Scalar,
    speech_level: Scalar,
    social_response: Scalar,
    sensory_reactions: OneOrMany,
}

/// A JSON string or number, rendered as text for the prompt.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Scalar>),
    One(Scalar),
}

impl AnalyzeFields {
    pub fn from_body(body: &Value) -> Result<Self, AppError> {
        let required = RequiredFields::deserialize(body)
            .map_err(|e| AppError::Validation(format!("Invalid analysis request: {e}")))?;

        let sensory_reactions: Vec<String> = match required.sensory_reactions {
            OneOrMany::Many(items) => items.into_iter().map(Scalar::into_text).collect(),
            OneOrMany::One(item) => vec![item.into_text()],
        };
        let sensory_reactions: Vec<String> =
            sensory_reactions.into_iter().filter(|s| !s.is_empty()).collect();

        let fields = AnalyzeFields {
            child_name: first_text(body, CHILD_NAME_KEYS),
            guardian_name: first_text(body, GUARDIAN_NAME_KEYS),
            age: required.age.into_text(),
            eye_contact: required.eye_contact.into_text(),
            speech_level: required.speech_level.into_text(),
            social_response: required.social_response.into_text(),
            sensory_reactions,
        };
        fields.ensure_not_blank()?;
        Ok(fields)
    }

    fn ensure_not_blank(&self) -> Result<(), AppError> {
        let mut blank = Vec::new();
        for (name, value) in [
            ("age", &self.age),
            ("eyeContact", &self.eye_contact),
            ("speechLevel", &self.speech_level),
            ("socialResponse", &self.social_response),
        ] {
            if value.is_empty() {
                blank.push(name);
            }
        }
        if self.sensory_reactions.is_empty() {
            blank.push("sensoryReactions");
        }

        if blank.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Required fields are blank: {}",
                blank.join(", ")
            )))
        }
    }
}

/// First non-blank string found under any of `keys`.
fn first_text(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}
