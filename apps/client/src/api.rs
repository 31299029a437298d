//! HTTP client for `POST /api/analyze`.

use avni_common::{AnalysisResult, Submission};
use reqwest::Client;
use tracing::{debug, error};

use crate::error::ClientError;

#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issues exactly one POST. Non-2xx statuses are errors even when the
    /// server attached placeholder lists to its 500 body.
    pub async fn analyze(&self, submission: &Submission) -> Result<AnalysisResult, ClientError> {
        let url = format!("{}/api/analyze", self.base_url);
        debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .json(&submission.to_payload())
            .send()
            .await
            .map_err(|e| {
                error!("Fetch error: {e}");
                ClientError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Analysis service returned {status}: {body}");
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<AnalysisResult>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use avni_common::{EyeContact, SensoryReaction, SocialResponse, SpeechLevel};
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn submission() -> Submission {
        Submission {
            child_name: "Aarav Kumar".to_string(),
            guardian_name: "Ravi Kumar".to_string(),
            age: 5,
            eye_contact: EyeContact::Poor,
            speech_level: SpeechLevel::NonVerbal,
            social_response: SocialResponse::Withdrawn,
            sensory_reactions: SensoryReaction::Extreme,
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_posts_wrapped_sensory_list_and_parses_result() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/analyze",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(body);
                    Json(json!({
                        "therapy_goals": ["a", "b", "c"],
                        "activities": [
                            {"title": "One", "description": "first"},
                            {"title": "Two", "description": "second"}
                        ]
                    }))
                }
            }),
        );
        let client = AnalysisClient::new(&spawn_stub(router).await);

        let result = client.analyze(&submission()).await.unwrap();

        assert_eq!(result.therapy_goals.len(), 3);
        assert_eq!(result.activities[1].title, "Two");
        let bodies = seen.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["sensoryReactions"], json!(["Extreme"]));
        assert_eq!(bodies[0]["age"], 5);
    }

    #[tokio::test]
    async fn test_server_error_is_status_error_with_retry_message() {
        let router = Router::new().route(
            "/api/analyze",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "AI processing failed", "message": "boom",
                        "therapy_goals": ["Error: Unable to generate goals"],
                        "activities": [{"title": "Error", "description": "Unable to generate activities"}]})),
                )
            }),
        );
        let client = AnalysisClient::new(&spawn_stub(router).await);

        let err = client.analyze(&submission()).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { status: 500 }));
        assert_eq!(err.user_message(), "Failed to get AI analysis. Please try again.");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = AnalysisClient::new(&format!("http://{addr}"));

        let err = client.analyze(&submission()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_missing_lists_in_response_default_to_empty() {
        let router = Router::new().route("/api/analyze", post(|| async { Json(json!({})) }));
        let client = AnalysisClient::new(&spawn_stub(router).await);

        let result = client.analyze(&submission()).await.unwrap();
        assert!(result.therapy_goals.is_empty());
        assert!(result.activities.is_empty());
    }
}
