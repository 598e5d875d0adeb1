use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Structured output schema for dream analysis.
///
/// The completion model is instructed to produce exactly this shape; the
/// normalizer below re-validates every field before anything downstream may
/// rely on it. The instruction alone is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DreamAnalysis {
    pub title: String,
    pub interpretation: String,
    pub mood: String,
    pub keywords: Vec<String>,
}

/// Helper function to create the JSON schema for dream analysis
pub fn get_dream_analysis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "A short, creative title for the dream"
            },
            "interpretation": {
                "type": "string",
                "description": "A 3-4 sentence psychological analysis of what the dream might mean regarding the user's waking life"
            },
            "mood": {
                "type": "string",
                "description": "One word describing the emotional tone (e.g., Anxious, Peaceful, Confusing)"
            },
            "keywords": {
                "type": "array",
                "items": {
                    "type": "string"
                },
                "description": "Symbolic tags extracted from the dream"
            }
        },
        "required": ["title", "interpretation", "mood", "keywords"]
    })
}

/// Parses and validates the raw completion text into a [`DreamAnalysis`].
///
/// # Errors
///
/// * `AppError::MalformedAiResponse` if the text is not a JSON object.
/// * `AppError::IncompleteAiResponse` if any required field is missing,
///   empty, or of the wrong type.
pub fn parse_analysis_response(response_text: &str) -> Result<DreamAnalysis, AppError> {
    // Clean JSON response (strip markdown code blocks if present)
    let cleaned_json = if response_text.trim().starts_with("```json") {
        response_text
            .trim()
            .strip_prefix("```json")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(response_text)
            .trim()
    } else if response_text.trim().starts_with("```") {
        response_text
            .trim()
            .strip_prefix("```")
            .and_then(|s| s.strip_suffix("```"))
            .unwrap_or(response_text)
            .trim()
    } else {
        response_text.trim()
    };

    let value: serde_json::Value = serde_json::from_str(cleaned_json).map_err(|e| {
        AppError::MalformedAiResponse(format!("{e}. Response: {response_text}"))
    })?;

    let obj = value.as_object().ok_or_else(|| {
        AppError::MalformedAiResponse(format!("expected a JSON object, got: {value}"))
    })?;

    for field in ["title", "interpretation", "mood"] {
        match obj.get(field).and_then(serde_json::Value::as_str) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(AppError::IncompleteAiResponse(format!(
                    "field '{field}' is missing, empty, or not a string"
                )));
            }
        }
    }

    if !obj.get("keywords").is_some_and(serde_json::Value::is_array) {
        return Err(AppError::IncompleteAiResponse(
            "field 'keywords' is missing or not an array".to_string(),
        ));
    }

    // Field-level checks passed; a deserialization failure now means a
    // non-string keyword entry.
    serde_json::from_value(value).map_err(|e| {
        AppError::IncompleteAiResponse(format!("keywords must be an array of strings: {e}"))
    })
}
