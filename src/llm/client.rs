use async_trait::async_trait;
use genai::{
    chat::{ChatOptions, ChatRequest, ChatResponse},
    Client, ClientBuilder,
};
use std::sync::Arc;

use super::AiClient;
use crate::errors::AppError;

/// Wrapper struct around the genai::Client to implement our AiClient trait.
///
/// The underlying client resolves provider credentials (e.g. `OPENAI_API_KEY`)
/// from the environment at call time.
pub struct SomniaAiClient {
    inner: Client,
}

#[async_trait]
impl AiClient for SomniaAiClient {
    /// Executes a chat request using the underlying genai::Client.
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        config_override: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        self.inner
            .exec_chat(model_name, request, config_override.as_ref())
            .await
            .map_err(AppError::from)
    }
}

/// Implement AiClient for Arc<SomniaAiClient>
#[async_trait]
impl AiClient for Arc<SomniaAiClient> {
    async fn exec_chat(
        &self,
        model_name: &str,
        request: ChatRequest,
        config_override: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        (**self)
            .exec_chat(model_name, request, config_override)
            .await
    }
}

/// Builds the SomniaAiClient wrapper.
pub fn build_ai_client() -> Arc<SomniaAiClient> {
    let client = ClientBuilder::default().build();
    Arc::new(SomniaAiClient { inner: client })
}
