// src/test_helpers.rs
// Mock collaborators and router builders shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use genai::{
    adapter::AdapterKind,
    chat::{ChatOptions, ChatRequest, ChatResponse, MessageContent},
    ModelIden,
};

use crate::auth::{IdentityVerifier, Principal};
use crate::config::Config;
use crate::errors::AppError;
use crate::llm::AiClient;
use crate::routes::app_router;
use crate::state::AppState;

/// Mock [`AiClient`] that records the last request/options and returns a
/// preset response. Interior state is behind `Arc<Mutex<..>>` so a clone
/// handed to the router shares state with the handle kept by the test.
#[derive(Clone)]
pub struct MockAiClient {
    last_request: Arc<Mutex<Option<ChatRequest>>>,
    last_options: Arc<Mutex<Option<ChatOptions>>>,
    response_to_return: Arc<Mutex<Result<ChatResponse, AppError>>>,
    response_delay: Arc<Mutex<Option<Duration>>>,
    call_count: Arc<AtomicUsize>,
}

fn text_chat_response(text: String) -> ChatResponse {
    ChatResponse {
        model_iden: ModelIden::new(AdapterKind::OpenAI, "mock-model"),
        content: Some(MessageContent::Text(text)),
        reasoning_content: None,
        usage: Default::default(),
    }
}

impl MockAiClient {
    pub fn new() -> Self {
        Self {
            last_request: Arc::new(Mutex::new(None)),
            last_options: Arc::new(Mutex::new(None)),
            response_to_return: Arc::new(Mutex::new(Ok(text_chat_response(
                "Mock AI response".to_string(),
            )))),
            response_delay: Arc::new(Mutex::new(None)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock that responds with the given text as the completion body.
    pub fn with_text_response(text: String) -> Self {
        let mock = Self::new();
        mock.set_text_response(text);
        mock
    }

    pub fn get_last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }

    pub fn get_last_options(&self) -> Option<ChatOptions> {
        self.last_options.lock().unwrap().clone()
    }

    pub fn set_response(&self, response: Result<ChatResponse, AppError>) {
        *self.response_to_return.lock().unwrap() = response;
    }

    pub fn set_text_response(&self, text: String) {
        self.set_response(Ok(text_chat_response(text)));
    }

    /// Delays every reply, to simulate a slow upstream collaborator.
    pub fn set_response_delay(&self, delay: Duration) {
        *self.response_delay.lock().unwrap() = Some(delay);
    }

    /// Number of times `exec_chat` was invoked.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn exec_chat(
        &self,
        _model_name: &str,
        request: ChatRequest,
        config_override: Option<ChatOptions>,
    ) -> Result<ChatResponse, AppError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        *self.last_options.lock().unwrap() = config_override;
        let delay = *self.response_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.response_to_return.lock().unwrap().clone()
    }
}

/// Mock [`IdentityVerifier`] with a settable resolution result.
#[derive(Clone)]
pub struct MockIdentityVerifier {
    result_to_return: Arc<Mutex<Result<Principal, AppError>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockIdentityVerifier {
    /// Defaults to successfully resolving a fixed test principal.
    pub fn new() -> Self {
        Self {
            result_to_return: Arc::new(Mutex::new(Ok(Principal {
                id: "user-123".to_string(),
                email: Some("dreamer@example.com".to_string()),
            }))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rejects every token from now on, as the provider does for invalid or
    /// expired credentials.
    pub fn reject_tokens(&self) {
        self.set_result(Err(AppError::Unauthorized(
            "identity provider returned 401".to_string(),
        )));
    }

    pub fn set_result(&self, result: Result<Principal, AppError>) {
        *self.result_to_return.lock().unwrap() = result;
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockIdentityVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, _token: &str) -> Result<Principal, AppError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.result_to_return.lock().unwrap().clone()
    }
}

/// Holds the router under test together with handles to its mocks.
pub struct TestApp {
    pub router: Router,
    pub mock_ai_client: MockAiClient,
    pub mock_identity_verifier: MockIdentityVerifier,
}

/// Builds the real application router wired to mock collaborators.
pub fn spawn_test_app() -> TestApp {
    spawn_test_app_with_config(Config::default())
}

pub fn spawn_test_app_with_config(config: Config) -> TestApp {
    let mock_ai_client = MockAiClient::new();
    let mock_identity_verifier = MockIdentityVerifier::new();

    let state = AppState::new(
        Arc::new(config),
        Arc::new(mock_ai_client.clone()),
        Arc::new(mock_identity_verifier.clone()),
    );

    TestApp {
        router: app_router(state),
        mock_ai_client,
        mock_identity_verifier,
    }
}
