// src/routes/analyze_dream.rs
// POST /api/analyze-dream: validate -> authenticate -> invoke -> normalize.

use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::bearer_token;
use crate::errors::AppError;
use crate::services::analysis_structured_output::DreamAnalysis;
use crate::services::dream_analysis_service::analyze_dream;
use crate::state::AppState;

/// Validates the parsed payload and returns the dream text.
///
/// Works on a raw JSON value so the gate owns the exact client-facing error
/// message rather than leaking a deserializer rejection.
fn extract_dream_content(payload: &Value, max_bytes: usize) -> Result<&str, AppError> {
    let content = payload
        .get("dreamContent")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput("dreamContent is required and must be a string".to_string())
        })?;

    // Bound downstream completion cost; the client enforces a softer cap.
    if content.len() > max_bytes {
        return Err(AppError::InvalidInput(format!(
            "dreamContent exceeds the maximum allowed size of {max_bytes} bytes"
        )));
    }

    Ok(content)
}

/// Analyzes a dream for an authenticated caller.
///
/// Strictly linear per request: the gate runs before the identity lookup, and
/// both run before the paid completion call so anonymous or malformed traffic
/// never reaches the upstream model.
#[instrument(skip(state, headers, body), err)]
pub async fn analyze_dream_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<DreamAnalysis>, AppError> {
    // Parse the body here instead of via the Json extractor so even a
    // syntactically invalid payload gets the JSON error envelope.
    let payload: Value = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON body: {e}")))?;
    let dream_content = extract_dream_content(&payload, state.config.max_dream_content_bytes)?;

    let token = bearer_token(&headers)?;
    let principal = state.identity_verifier.verify(token).await?;

    let analysis = analyze_dream(state.ai_client.as_ref(), &state.config, dream_content).await?;

    info!(user_id = %principal.id, "Dream analyzed");
    Ok(Json(analysis))
}
