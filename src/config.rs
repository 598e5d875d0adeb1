// src/config.rs

use serde::Deserialize;

/// Runtime configuration, deserialized from environment variables with envy.
///
/// The completion provider's API key is not held here: the genai client reads
/// it from the environment itself (e.g. `OPENAI_API_KEY`).
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    // Server Config
    #[serde(default = "default_port")]
    pub port: u16,

    // Identity provider (GoTrue-style) used to resolve bearer tokens
    pub identity_base_url: Option<String>,
    pub identity_service_key: Option<String>,
    #[serde(default = "default_identity_timeout_secs")]
    pub identity_timeout_secs: u64,

    // Completion Config
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f64,
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: u32,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    // Request Gate Config
    #[serde(default = "default_max_dream_content_bytes")]
    pub max_dream_content_bytes: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_identity_timeout_secs() -> u64 {
    10
}

fn default_analysis_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_analysis_temperature() -> f64 {
    0.7
}

fn default_analysis_max_tokens() -> u32 {
    500
}

fn default_upstream_timeout_secs() -> u64 {
    30
}

fn default_max_dream_content_bytes() -> usize {
    50_000
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `anyhow::Error` if environment variable parsing fails, such as
    /// when a variable has an invalid format.
    pub fn load() -> Result<Self, anyhow::Error> {
        envy::from_env::<Self>().map_err(anyhow::Error::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            identity_base_url: None,
            identity_service_key: None,
            identity_timeout_secs: default_identity_timeout_secs(),
            analysis_model: default_analysis_model(),
            analysis_temperature: default_analysis_temperature(),
            analysis_max_tokens: default_analysis_max_tokens(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            max_dream_content_bytes: default_max_dream_content_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_analysis_contract() {
        let config = Config::default();
        assert_eq!(config.analysis_model, "gpt-4o-mini");
        assert_eq!(config.analysis_max_tokens, 500);
        assert!((config.analysis_temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.upstream_timeout_secs, 30);
    }
}
