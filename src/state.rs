use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::config::Config;
use crate::llm::AiClient;

/// Shared application state.
///
/// Collaborators are constructed once at startup and passed in explicitly;
/// there are no lazily-initialized module globals. The service itself is
/// stateless per request, so the state is cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ai_client: Arc<dyn AiClient>,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        ai_client: Arc<dyn AiClient>,
        identity_verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            config,
            ai_client,
            identity_verifier,
        }
    }
}
