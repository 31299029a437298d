use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {field} (expected one of: {options})")]
pub struct RatingParseError {
    pub field: &'static str,
    pub value: String,
    pub options: String,
}

/// Declares a closed rating scale. Each variant carries the exact label the
/// form shows and the wire carries.
macro_rules! rating_scale {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const FIELD: &'static str = $field;

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|r| r.label()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = RatingParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|r| r.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| RatingParseError {
                        field: $field,
                        value: s.to_string(),
                        options: Self::labels().join(", "),
                    })
            }
        }
    };
}

rating_scale! {
    /// How readily the child holds eye contact.
    EyeContact, "eye contact" {
        Good => "Good",
        Moderate => "Moderate",
        Poor => "Poor",
    }
}

rating_scale! {
    SpeechLevel, "speech level" {
        Normal => "Normal",
        Delayed => "Delayed",
        NonVerbal => "Non-verbal",
    }
}

rating_scale! {
    SocialResponse, "social response" {
        Interactive => "Interactive",
        Limited => "Limited",
        Withdrawn => "Withdrawn",
    }
}

rating_scale! {
    /// Reaction to sound, light and touch.
    SensoryReaction, "sensory reaction" {
        Normal => "Normal",
        Sensitive => "Sensitive",
        Extreme => "Extreme",
    }
}

/// One completed intake form.
///
/// The form selects a single sensory reaction; the wire format carries a list
/// (see [`SubmissionPayload`]). Legacy field names are accepted on input only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "ChildName", alias = "studentName")]
    pub child_name: String,
    #[serde(alias = "ParentsName", alias = "parentsName", alias = "fatherName")]
    pub guardian_name: String,
    pub age: u8,
    pub eye_contact: EyeContact,
    pub speech_level: SpeechLevel,
    pub social_response: SocialResponse,
    pub sensory_reactions: SensoryReaction,
}

/// The JSON body POSTed to `/api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload<'a> {
    pub child_name: &'a str,
    pub guardian_name: &'a str,
    pub age: u8,
    pub eye_contact: EyeContact,
    pub speech_level: SpeechLevel,
    pub social_response: SocialResponse,
    pub sensory_reactions: Vec<SensoryReaction>,
}

impl Submission {
    /// Wire form of this submission. The single sensory selection is wrapped
    /// into a one-element list because the server expects an array.
    pub fn to_payload(&self) -> SubmissionPayload<'_> {
        SubmissionPayload {
            child_name: &self.child_name,
            guardian_name: &self.guardian_name,
            age: self.age,
            eye_contact: self.eye_contact,
            speech_level: self.speech_level,
            social_response: self.social_response,
            sensory_reactions: vec![self.sensory_reactions],
        }
    }
}
