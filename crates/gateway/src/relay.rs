//! Relay of verified identity claims to the backend of record.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::{RelayRequest, RelayResponse};
use thiserror::Error;

use crate::auth::types::IdentityClaim;

const RELAY_PATH: &str = "/api/auth/google-callback";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Backend relay timed out")]
    Timeout,

    #[error("Backend relay transport error: {0}")]
    Transport(String),

    /// The backend answered but refused the login.
    #[error("Backend rejected login: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl RelayError {
    /// Message reported by the backend, if it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            RelayError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

/// A successful relay: the backend issued a token for the user.
#[derive(Debug, Clone)]
pub struct RelayGrant {
    pub token: String,
    pub user: serde_json::Value,
    pub is_new_user: Option<bool>,
}

#[async_trait]
pub trait BackendRelay: Send + Sync {
    async fn relay(&self, claim: &IdentityClaim) -> Result<RelayGrant, RelayError>;
}

pub struct HttpBackendRelay {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpBackendRelay {
    pub fn new(backend_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", backend_url.trim_end_matches('/'), RELAY_PATH),
            timeout,
        }
    }
}

impl From<&IdentityClaim> for RelayRequest {
    fn from(claim: &IdentityClaim) -> Self {
        RelayRequest {
            google_id: claim.provider_id.clone(),
            email: claim.email.clone(),
            name: claim.display_name.clone(),
            picture: claim.picture_url.clone(),
            access_token: claim.access_token.clone(),
        }
    }
}

fn into_grant(response: RelayResponse) -> Result<RelayGrant, RelayError> {
    if !response.success {
        return Err(RelayError::Rejected {
            message: response.message,
        });
    }
    let token = response
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RelayError::InvalidResponse("missing token".to_string()))?;

    Ok(RelayGrant {
        token,
        user: response.user.unwrap_or(serde_json::Value::Null),
        is_new_user: response.is_new_user,
    })
}

#[async_trait]
impl BackendRelay for HttpBackendRelay {
    async fn relay(&self, claim: &IdentityClaim) -> Result<RelayGrant, RelayError> {
        tracing::debug!(endpoint = %self.endpoint, provider_id = %claim.provider_id, "Relaying login");

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&RelayRequest::from(claim))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout
                } else {
                    RelayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::Timeout
            } else {
                RelayError::Transport(e.to_string())
            }
        })?;

        let parsed: Result<RelayResponse, _> = serde_json::from_slice(&body);
        if !status.is_success() {
            tracing::warn!(%status, "Backend relay returned an error status");
            return Err(RelayError::Rejected {
                message: parsed.ok().and_then(|r| r.message),
            });
        }

        let parsed = parsed.map_err(|e| RelayError::InvalidResponse(e.to_string()))?;
        into_grant(parsed)
    }
}
