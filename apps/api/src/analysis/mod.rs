// Analysis Service: lenient intake parsing, prompt construction, model-output
// normalization and the POST /api/analyze handler.
// All model calls go through llm_client::TextModel.

pub mod handlers;
pub mod normalize;
pub mod prompts;
pub mod request;
