//! Axum route handler for the Analysis API.

use avni_common::AnalysisResult;
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analysis::normalize::{normalize_model_output, NormalizedAnalysis};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::request::AnalyzeFields;
use crate::errors::AppError;
use crate::llm_client::MODEL;
use crate::state::AppState;
use crate::store::PersistedRecord;

/// POST /api/analyze
///
/// Model call, then store write, sequentially. A malformed model reply still
/// yields 200 with placeholder lists; a failed call or write yields the 500
/// failure body.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AnalysisResult>, AppError> {
    let fields = AnalyzeFields::from_body(&body)?;
    debug!("Form data received: {body}");

    let prompt = build_analysis_prompt(&fields);
    info!("Calling {MODEL} for analysis...");
    let raw = state.model.generate(&prompt).await?;
    debug!("AI raw text: {raw}");

    let normalized = normalize_model_output(&raw);
    if let NormalizedAnalysis::Placeholder { reason } = &normalized {
        warn!("Model reply is not valid analysis JSON, using placeholder: {reason}");
    }
    let result = normalized.into_result();

    let record = PersistedRecord::new(body, &fields, result.clone());
    state.store.append(&record).await?;

    Ok(Json(result))
}
