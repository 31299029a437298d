// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file holds only the cross-cutting pieces.

/// Appended to every prompt whose answer is parsed as JSON.
pub const RAW_JSON_INSTRUCTION: &str =
    "ONLY RETURN RAW JSON, do NOT include any markdown formatting or code blocks.";
