// Analysis prompt template. Placeholders are replaced by `build_analysis_prompt`.

use crate::analysis::request::AnalyzeFields;
use crate::llm_client::prompts::RAW_JSON_INSTRUCTION;

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Based on this child's responses, give 3 short therapy goals and 2 activities that can help improvement.
For each activity, also provide a short heading/title.
Child details:
Age: {age}
Eye Contact: {eye_contact}
Speech Level: {speech_level}
Social Response: {social_response}
Sensory Reactions: {sensory_reactions}

{raw_json_instruction}
Format:
{
  "therapy_goals": ["Goal 1","Goal 2","Goal 3"],
  "activities": [
    {"title": "Activity 1 heading", "description": "Activity 1 description"},
    {"title": "Activity 2 heading", "description": "Activity 2 description"}
  ]
}"#;

/// Fills the analysis template with the child's attributes.
pub fn build_analysis_prompt(fields: &AnalyzeFields) -> String {
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{age}", &fields.age)
        .replace("{eye_contact}", &fields.eye_contact)
        .replace("{speech_level}", &fields.speech_level)
        .replace("{social_response}", &fields.social_response)
        .replace("{sensory_reactions}", &fields.sensory_reactions.join(", "))
        .replace("{raw_json_instruction}", RAW_JSON_INSTRUCTION)
}
