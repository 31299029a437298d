use thiserror::Error;

/// Shown to the user for any failed analysis request.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to get AI analysis. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to analysis service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Analysis service responded with status {status}")]
    Status { status: u16 },
}

impl ClientError {
    /// Every transport failure surfaces as the same retry prompt.
    pub fn user_message(&self) -> &'static str {
        ANALYSIS_FAILED_MESSAGE
    }
}
