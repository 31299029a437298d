//! Report sessions and view navigation.
//!
//! A session is created from a successful analysis and handed to the result
//! and report views by id. Sessions are replaced, never edited in place.

use std::collections::HashMap;

use avni_common::{AnalysisResult, Submission};
use uuid::Uuid;

use crate::emotion::EmotionObservation;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSession {
    pub id: Uuid,
    pub submission: Submission,
    pub result: AnalysisResult,
    pub emotion: Option<EmotionObservation>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, ReportSession>,
}

impl SessionStore {
    pub fn open(&mut self, submission: Submission, result: AnalysisResult) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            ReportSession {
                id,
                submission,
                result,
                emotion: None,
            },
        );
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&ReportSession> {
        self.sessions.get(&id)
    }

    /// Replaces the session with one carrying `emotion`. Returns false if the
    /// id is unknown.
    pub fn attach_emotion(&mut self, id: Uuid, emotion: EmotionObservation) -> bool {
        let Some(current) = self.sessions.get(&id) else {
            return false;
        };
        let next = ReportSession {
            emotion: Some(emotion),
            ..current.clone()
        };
        self.sessions.insert(id, next);
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Where the interactive client is. Result and report views may be reached
/// without a session, in which case they show their empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Results(Option<Uuid>),
    Report(Option<Uuid>),
    Exit,
}
