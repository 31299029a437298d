use std::sync::Arc;

use crate::llm_client::TextModel;
use crate::store::ReportStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Nothing in here is mutated per request; each analysis is independent apart
/// from the append-only store.
#[derive(Clone)]
pub struct AppState {
    /// Generative model. Default: `GeminiClient`.
    pub model: Arc<dyn TextModel>,
    /// Append-only record store. Default: `PgReportStore`.
    pub store: Arc<dyn ReportStore>,
}
