//! The intake form.
//!
//! `FormState` is a value: every transition returns a new state. Field values
//! survive a failed submission so the user can retry without retyping.

use avni_common::{
    AnalysisResult, EyeContact, SensoryReaction, SocialResponse, SpeechLevel, Submission,
};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use tracing::info;

use crate::api::AnalysisClient;

pub const MAX_AGE: u8 = 25;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub child_name: String,
    pub guardian_name: String,
    pub age: String,
    pub eye_contact: Option<EyeContact>,
    pub speech_level: Option<SpeechLevel>,
    pub social_response: Option<SocialResponse>,
    pub sensory_reaction: Option<SensoryReaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Editing,
    Submitting,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub fields: FormFields,
    pub status: FormStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(FormFields::default())
    }
}

impl FormState {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            status: FormStatus::Editing,
        }
    }

    pub fn with_fields(self, fields: FormFields) -> Self {
        Self {
            fields,
            status: FormStatus::Editing,
        }
    }

    pub fn submitting(self) -> Self {
        Self {
            status: FormStatus::Submitting,
            ..self
        }
    }

    pub fn failed(self, message: impl Into<String>) -> Self {
        Self {
            status: FormStatus::Failed(message.into()),
            ..self
        }
    }

    /// The submit action is disabled while a request is in flight.
    pub fn is_busy(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FormStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// All fields are mandatory; names must be non-blank and age within 0..=25.
    pub fn validate(&self) -> Result<Submission, Vec<FieldError>> {
        let f = &self.fields;
        let mut errors = Vec::new();
        let mut require = |field: &'static str, ok: bool, message: &str| {
            if !ok {
                errors.push(FieldError {
                    field,
                    message: message.to_string(),
                });
            }
        };

        require("childName", !f.child_name.trim().is_empty(), "is required");
        require("guardianName", !f.guardian_name.trim().is_empty(), "is required");
        let age = parse_age(&f.age);
        require(
            "age",
            age.is_ok(),
            age.as_ref().err().map(String::as_str).unwrap_or_default(),
        );
        require("eyeContact", f.eye_contact.is_some(), "select an option");
        require("speechLevel", f.speech_level.is_some(), "select an option");
        require("socialResponse", f.social_response.is_some(), "select an option");
        require("sensoryReactions", f.sensory_reaction.is_some(), "select an option");

        match (age, f.eye_contact, f.speech_level, f.social_response, f.sensory_reaction) {
            (Ok(age), Some(eye_contact), Some(speech_level), Some(social_response), Some(sensory))
                if errors.is_empty() =>
            {
                Ok(Submission {
                    child_name: f.child_name.trim().to_string(),
                    guardian_name: f.guardian_name.trim().to_string(),
                    age,
                    eye_contact,
                    speech_level,
                    social_response,
                    sensory_reactions: sensory,
                })
            }
            _ => Err(errors),
        }
    }
}

pub fn parse_age(input: &str) -> Result<u8, String> {
    let age: u8 = input
        .trim()
        .parse()
        .map_err(|_| format!("must be a whole number between 0 and {MAX_AGE}"))?;
    if age > MAX_AGE {
        return Err(format!("must be a whole number between 0 and {MAX_AGE}"));
    }
    Ok(age)
}

/// Validates and submits once. On any failure the returned state is `Failed`
/// with the fields untouched; a state already submitting is handed back as is.
pub async fn submit(
    state: FormState,
    client: &AnalysisClient,
) -> Result<(Submission, AnalysisResult), FormState> {
    if state.is_busy() {
        return Err(state);
    }
    let submission = match state.validate() {
        Ok(submission) => submission,
        Err(errors) => {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(state.failed(message));
        }
    };

    let state = state.submitting();
    match client.analyze(&submission).await {
        Ok(result) => {
            info!(
                "Analysis received: {} goals, {} activities",
                result.therapy_goals.len(),
                result.activities.len()
            );
            Ok((submission, result))
        }
        Err(e) => Err(state.failed(e.user_message())),
    }
}

/// Prompts for every field, pre-filled with `previous`.
pub fn prompt_fields(previous: &FormFields) -> anyhow::Result<FormFields> {
    let theme = ColorfulTheme::default();

    let child_name: String = Input::with_theme(&theme)
        .with_prompt("Child's name")
        .with_initial_text(previous.child_name.clone())
        .validate_with(|s: &String| not_blank(s))
        .interact_text()?;
    let guardian_name: String = Input::with_theme(&theme)
        .with_prompt("Parent / guardian name")
        .with_initial_text(previous.guardian_name.clone())
        .validate_with(|s: &String| not_blank(s))
        .interact_text()?;
    let age: String = Input::with_theme(&theme)
        .with_prompt("Age")
        .with_initial_text(previous.age.clone())
        .validate_with(|s: &String| parse_age(s).map(|_| ()))
        .interact_text()?;

    let eye_contact = select(&theme, "Eye contact", EyeContact::ALL, previous.eye_contact)?;
    let speech_level = select(&theme, "Speech level", SpeechLevel::ALL, previous.speech_level)?;
    let social_response = select(
        &theme,
        "Social response",
        SocialResponse::ALL,
        previous.social_response,
    )?;
    let sensory_reaction = select(
        &theme,
        "Sensory reactions",
        SensoryReaction::ALL,
        previous.sensory_reaction,
    )?;

    Ok(FormFields {
        child_name,
        guardian_name,
        age,
        eye_contact: Some(eye_contact),
        speech_level: Some(speech_level),
        social_response: Some(social_response),
        sensory_reaction: Some(sensory_reaction),
    })
}

fn not_blank(s: &str) -> Result<(), &'static str> {
    if s.trim().is_empty() {
        Err("this field is required")
    } else {
        Ok(())
    }
}

fn select<T>(
    theme: &ColorfulTheme,
    prompt: &str,
    options: &[T],
    previous: Option<T>,
) -> anyhow::Result<T>
where
    T: Copy + PartialEq + std::fmt::Display,
{
    let labels: Vec<String> = options.iter().map(ToString::to_string).collect();
    let default = previous
        .and_then(|p| options.iter().position(|o| *o == p))
        .unwrap_or(0);
    let index = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(options[index])
}
