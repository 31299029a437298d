//! Append-only persistence of analysed submissions.
//!
//! The service only ever writes; there is no read, update or delete path.
//! `AppState` carries an `Arc<dyn ReportStore>` so handlers never see sqlx.

use async_trait::async_trait;
use avni_common::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::request::AnalyzeFields;
use crate::errors::AppError;

#[cfg(test)]
pub mod memory;

/// One stored submission: the raw body as received, plus the result sent back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub id: Uuid,
    pub child_name: Option<String>,
    pub guardian_name: Option<String>,
    pub submission: Value,
    pub ai_response: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

impl PersistedRecord {
    /// Stamps the record with a fresh id and the current server time.
    pub fn new(submission: Value, fields: &AnalyzeFields, ai_response: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            child_name: fields.child_name.clone(),
            guardian_name: fields.guardian_name.clone(),
            submission,
            ai_response,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn append(&self, record: &PersistedRecord) -> Result<(), AppError>;
}

/// PostgreSQL-backed store writing to `ai_reports`.
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn append(&self, record: &PersistedRecord) -> Result<(), AppError> {
        // Append-only: INSERT, never UPDATE
        sqlx::query(
            r#"
            INSERT INTO ai_reports
                (id, child_name, guardian_name, submission, ai_response, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.child_name)
        .bind(&record.guardian_name)
        .bind(&record.submission)
        .bind(sqlx::types::Json(&record.ai_response))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        info!("Saved analysis record {}", record.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> AnalyzeFields {
        AnalyzeFields {
            child_name: Some("Aarav".to_string()),
            guardian_name: Some("Ravi".to_string()),
            age: "5".to_string(),
            eye_contact: "Poor".to_string(),
            speech_level: "Non-verbal".to_string(),
            social_response: "Withdrawn".to_string(),
            sensory_reactions: vec!["Extreme".to_string()],
        }
    }

    #[test]
    fn test_record_keeps_raw_submission_verbatim() {
        let body = json!({"ChildName": "Aarav", "age": "5", "extra": true});
        let record = PersistedRecord::new(body.clone(), &fields(), AnalysisResult::parse_failure());
        assert_eq!(record.submission, body);
        assert_eq!(record.child_name.as_deref(), Some("Aarav"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = PersistedRecord::new(json!({}), &fields(), AnalysisResult::default());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("aiResponse").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_each_record_gets_a_new_id() {
        let a = PersistedRecord::new(json!({}), &fields(), AnalysisResult::default());
        let b = PersistedRecord::new(json!({}), &fields(), AnalysisResult::default());
        assert_ne!(a.id, b.id);
    }
}
