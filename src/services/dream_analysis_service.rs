use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponseFormat, JsonSpec,
};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm::AiClient;
use crate::services::analysis_structured_output::{
    get_dream_analysis_schema, parse_analysis_response, DreamAnalysis,
};

/// Version tag for the analyst system prompt. Bump when the prompt text or
/// the instructed output shape changes.
pub const ANALYST_PROMPT_VERSION: &str = "v1";

/// System prompt for the AI dream analyst.
pub const ANALYST_SYSTEM_PROMPT: &str = r#"You are an empathetic and insightful dream analyst utilizing Jungian psychology and modern symbolism.

Input: User's dream description.

Output: A JSON object with the following structure:
{
  "title": "A short, creative title for the dream",
  "interpretation": "A 3-4 sentence psychological analysis of what the dream might mean regarding the user's waking life.",
  "mood": "One word describing the emotional tone (e.g., Anxious, Peaceful, Confusing)",
  "keywords": ["tag1", "tag2", "tag3"]
}

Do not include markdown formatting like ```json. Return only the raw JSON."#;

/// Issues exactly one completion call for `dream_content` and normalizes the
/// model's structured output.
///
/// The upstream call is bounded by `config.upstream_timeout_secs`; a breach
/// maps to the same upstream-failure envelope as a transport error. No
/// retries are performed here and no partial result is ever synthesized.
#[instrument(skip(ai_client, config, dream_content), fields(prompt_version = ANALYST_PROMPT_VERSION))]
pub async fn analyze_dream(
    ai_client: &dyn AiClient,
    config: &Config,
    dream_content: &str,
) -> Result<DreamAnalysis, AppError> {
    let chat_request = ChatRequest::default()
        .with_system(ANALYST_SYSTEM_PROMPT)
        .append_message(ChatMessage::user(dream_content));

    let chat_options = ChatOptions::default()
        .with_temperature(config.analysis_temperature)
        .with_max_tokens(config.analysis_max_tokens)
        .with_response_format(ChatResponseFormat::JsonSpec(JsonSpec::new(
            "dream_analysis",
            get_dream_analysis_schema(),
        )));

    debug!(model = %config.analysis_model, "Executing dream analysis completion");

    let response = tokio::time::timeout(
        Duration::from_secs(config.upstream_timeout_secs),
        ai_client.exec_chat(&config.analysis_model, chat_request, Some(chat_options)),
    )
    .await
    .map_err(|_| {
        AppError::UpstreamUnavailable(format!(
            "completion request timed out after {}s",
            config.upstream_timeout_secs
        ))
    })??;

    let response_text = response.content_text_as_str().ok_or_else(|| {
        AppError::MalformedAiResponse("completion contained no text content".to_string())
    })?;

    parse_analysis_response(response_text)
}
