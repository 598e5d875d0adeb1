use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::errors::AppError;

/// The verified identity resolved from a caller's bearer credential.
///
/// Used only for authorization and observability; never persisted and never
/// embedded in analysis results.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
}

/// Resolves a bearer token to a verified [`Principal`] via an external
/// identity provider. Trait-object seam so tests can inject a mock.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolves the principal for `token`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the token is invalid, expired,
    /// malformed, or the provider cannot be reached.
    async fn verify(&self, token: &str) -> Result<Principal, AppError>;
}

/// Extracts the bearer token from the request headers.
///
/// # Errors
///
/// Returns `AppError::MissingAuthHeader` if the `Authorization` header is
/// absent or not valid UTF-8.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AppError::MissingAuthHeader)?;
    // Tolerate a raw token without a scheme, matching the lenient
    // `Bearer `-stripping behavior clients already rely on.
    Ok(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// Shape of the identity provider's user payload. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,
    email: Option<String>,
}

/// [`IdentityVerifier`] backed by a GoTrue-style HTTP identity provider:
/// `GET {base}/auth/v1/user` with the caller's bearer token and the service
/// `apikey` header.
pub struct HttpIdentityVerifier {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpIdentityVerifier {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(
        base_url: String,
        service_key: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build identity HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("identity provider request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Unauthorized(format!(
                "identity provider returned {status}"
            )));
        }

        let user: IdentityUser = response
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("invalid identity payload: {e}")))?;

        debug!(user_id = %user.id, "Resolved principal from bearer token");
        Ok(Principal {
            id: user.id,
            email: user.email,
        })
    }
}
