//! Wire types shared by the screening API (`avni-api`) and its terminal client.
//!
//! The server is deliberately lenient about what it accepts, so the strict
//! form-side types live here and the server only borrows the result shapes.

pub mod analysis;
pub mod submission;

pub use analysis::{Activity, AnalysisErrorBody, AnalysisResult};
pub use submission::{
    EyeContact, RatingParseError, SensoryReaction, SocialResponse, SpeechLevel, Submission,
    SubmissionPayload,
};
