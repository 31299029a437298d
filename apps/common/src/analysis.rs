use serde::{Deserialize, Serialize};

/// Error label carried in every 500 body from `/api/analyze`.
pub const AI_PROCESSING_FAILED: &str = "AI processing failed";

/// A recommended activity card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Activity {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Structured therapy recommendation.
///
/// Both lists are always present on the wire. Deserialization defaults an
/// absent list to empty so renderers never deal with a missing field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub therapy_goals: Vec<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl AnalysisResult {
    /// Substituted when the model answers with something that is not the expected JSON.
    pub fn parse_failure() -> Self {
        Self {
            therapy_goals: vec!["Could not generate goals".to_string()],
            activities: vec![
                Activity::new("Could not generate title", "Could not generate description"),
                Activity::new("Could not generate title", "Could not generate description"),
            ],
        }
    }

    /// Lists sent alongside a 500 when the model call or persistence fails.
    pub fn processing_error() -> Self {
        Self {
            therapy_goals: vec!["Error: Unable to generate goals".to_string()],
            activities: vec![Activity::new("Error", "Unable to generate activities")],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.therapy_goals.is_empty() && self.activities.is_empty()
    }
}

/// Body of a 500 from `/api/analyze`: an error label, the underlying message,
/// and placeholder lists so clients can still render something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisErrorBody {
    pub error: String,
    pub message: String,
    #[serde(flatten)]
    pub fallback: AnalysisResult,
}

impl AnalysisErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: AI_PROCESSING_FAILED.to_string(),
            message: message.into(),
            fallback: AnalysisResult::processing_error(),
        }
    }
}
