//! Analysis requester. Builds the review prompt and makes the single provider call.

use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, CompletionProvider};
use crate::review::models::AnalysisRequest;
use crate::review::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, NO_JOB_DESCRIPTION};

pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    let focus_areas = if request.options.focus_areas.is_empty() {
        "general review".to_string()
    } else {
        request
            .options
            .focus_areas
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    ANALYSIS_PROMPT_TEMPLATE
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{job_role}", &request.job_role)
        .replace("{industry}", &request.industry)
        .replace("{experience_level}", request.experience_level.label())
        .replace("{depth_instruction}", request.options.analysis_depth.instruction())
        .replace("{focus_areas}", &focus_areas)
        .replace(
            "{job_description}",
            request.job_description.as_deref().unwrap_or(NO_JOB_DESCRIPTION),
        )
        // Last, so placeholders inside the resume itself are left alone.
        .replace("{resume_text}", &request.resume_text)
}

pub fn analysis_system_prompt() -> String {
    format!("{ANALYSIS_SYSTEM} {JSON_ONLY_SYSTEM}")
}

/// Sends the request to `llm` and returns the raw analysis mapping.
/// The response must be a JSON object; anything else is a request failure.
pub async fn analyze_resume(
    request: &AnalysisRequest,
    llm: &dyn CompletionProvider,
) -> Result<Value, AppError> {
    let prompt = build_analysis_prompt(request);
    info!(
        "Requesting {} analysis for role '{}' ({} chars of resume)",
        llm.provider(),
        request.job_role,
        request.resume_text.len()
    );

    let analysis: Value = complete_json(llm, &prompt, &analysis_system_prompt()).await?;

    if !analysis.is_object() {
        return Err(AppError::Request(
            "provider returned JSON that is not an object".to_string(),
        ));
    }
    Ok(analysis)
}
