//! Tail of the OAuth flow: exchange, resolve, optionally relay, redirect.
//!
//! Every outcome is a redirect. Failures land on the frontend's error page
//! with a short human-readable message and never establish a session.

use serde::Deserialize;
use thiserror::Error;

use super::jwt;
use super::resolver::{ResolveError, SessionResolver};
use super::types::SessionIdentity;
use crate::relay::{RelayError, RelayGrant};
use crate::session::Session;
use crate::AppState;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Authentication failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    Exchanging,
    ClaimNormalized,
    DirectoryResolved,
    Relaying,
    Redirecting,
    Failed,
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Internal directory error: {0}")]
    InternalDirectoryError(String),

    #[error("Backend relay failed: {0}")]
    BackendRelayFailed(#[source] RelayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CallbackError {
    /// Message safe to show the user.
    pub fn user_message(&self) -> &str {
        match self {
            CallbackError::BackendRelayFailed(e) => {
                e.backend_message().unwrap_or(DEFAULT_FAILURE_MESSAGE)
            }
            _ => DEFAULT_FAILURE_MESSAGE,
        }
    }
}

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// A session created by a successful callback, plus its signed cookie value.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub session: Session,
    pub cookie_token: String,
}

#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub redirect_to: String,
    pub session: Option<EstablishedSession>,
}

pub struct CallbackDispatcher<'a> {
    state: &'a AppState,
}

impl<'a> CallbackDispatcher<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Run the callback to completion. `expected_state` is the OAuth state
    /// issued when the flow began.
    pub async fn dispatch(
        &self,
        params: CallbackParams,
        expected_state: Option<&str>,
    ) -> CallbackOutcome {
        match self.run(params, expected_state).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(stage = ?CallbackStage::Failed, "Auth callback failed: {}", err);
                CallbackOutcome {
                    redirect_to: error_redirect(
                        self.state.config.frontend_base(),
                        err.user_message(),
                    ),
                    session: None,
                }
            }
        }
    }

    async fn run(
        &self,
        params: CallbackParams,
        expected_state: Option<&str>,
    ) -> Result<CallbackOutcome, CallbackError> {
        tracing::debug!(stage = ?CallbackStage::Exchanging, "Auth callback received");

        if let Some(error) = params.error {
            return Err(CallbackError::ProviderAuthFailed(format!(
                "provider reported: {}",
                error
            )));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CallbackError::ProviderAuthFailed("missing authorization code".into()))?;
        match (expected_state, params.state.as_deref()) {
            (Some(expected), Some(actual)) if expected == actual => {}
            _ => {
                return Err(CallbackError::ProviderAuthFailed(
                    "OAuth state mismatch".into(),
                ))
            }
        }

        let grant = self
            .state
            .provider
            .exchange(&code)
            .await
            .map_err(|e| CallbackError::ProviderAuthFailed(e.to_string()))?;
        tracing::debug!(stage = ?CallbackStage::ClaimNormalized, "Grant exchanged");

        let resolution = SessionResolver::new(self.state.directory.as_ref())
            .resolve(&grant)
            .map_err(|e| match e {
                ResolveError::Claim(e) => CallbackError::ProviderAuthFailed(e.to_string()),
                ResolveError::Directory(e) => CallbackError::InternalDirectoryError(e.to_string()),
            })?;
        tracing::debug!(
            stage = ?CallbackStage::DirectoryResolved,
            provider_id = %resolution.claim.provider_id,
            is_new_user = resolution.identity.is_new_user,
            "Identity resolved"
        );

        let relayed = match &self.state.relay {
            Some(relay) => {
                tracing::debug!(stage = ?CallbackStage::Relaying, "Relaying to backend of record");
                let grant = relay
                    .relay(&resolution.claim)
                    .await
                    .map_err(CallbackError::BackendRelayFailed)?;
                Some(grant)
            }
            None => None,
        };

        let established = self.establish_session(
            &resolution.claim.provider_id,
            relayed.as_ref().map(|g| g.token.clone()),
        )?;

        let redirect_to = redirect_target(
            self.state.config.frontend_base(),
            &resolution.identity,
            relayed.as_ref(),
        );
        tracing::info!(
            stage = ?CallbackStage::Redirecting,
            provider_id = %resolution.claim.provider_id,
            "Successful login"
        );

        Ok(CallbackOutcome {
            redirect_to,
            session: Some(established),
        })
    }

    fn establish_session(
        &self,
        provider_id: &str,
        backend_token: Option<String>,
    ) -> Result<EstablishedSession, CallbackError> {
        let sessions = &self.state.sessions;
        let session = sessions
            .create(provider_id, backend_token)
            .map_err(|e| CallbackError::Internal(e.to_string()))?;

        match jwt::create_token(&self.state.config.session_secret, &session) {
            Ok(cookie_token) => Ok(EstablishedSession {
                session,
                cookie_token,
            }),
            Err(e) => {
                if let Err(cleanup) = sessions.destroy(&session.id) {
                    tracing::error!("Failed to discard unsigned session: {}", cleanup);
                }
                Err(CallbackError::Internal(format!("failed to sign session: {}", e)))
            }
        }
    }
}

/// Where a successful login lands.
///
/// New or unregistered users go to registration completion; everyone else to
/// the dashboard. A relayed login also carries the backend's token and user.
pub fn redirect_target(
    frontend_base: &str,
    identity: &SessionIdentity,
    relayed: Option<&RelayGrant>,
) -> String {
    let is_new_user = relayed
        .and_then(|g| g.is_new_user)
        .unwrap_or(identity.is_new_user);

    let mut target = if is_new_user || !identity.user.is_registration_complete {
        let flag = if is_new_user { "?new=true" } else { "" };
        format!("{}/complete-registration{}", frontend_base, flag)
    } else {
        format!("{}/dashboard?login=success", frontend_base)
    };

    if let Some(grant) = relayed {
        let separator = if target.contains('?') { '&' } else { '?' };
        target.push(separator);
        target.push_str(&format!(
            "token={}&user={}",
            urlencoding::encode(&grant.token),
            urlencoding::encode(&grant.user.to_string())
        ));
    }

    target
}

pub fn error_redirect(frontend_base: &str, message: &str) -> String {
    format!(
        "{}/auth/error?message={}",
        frontend_base,
        urlencoding::encode(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::{ProfileDetails, UserRecord};

    const BASE: &str = "http://app.example";

    fn identity(is_new_user: bool, complete: bool) -> SessionIdentity {
        let now = Utc::now();
        SessionIdentity {
            user: UserRecord {
                provider_id: "g-1".to_string(),
                email: "a@x.com".to_string(),
                display_name: "Ada".to_string(),
                picture_url: None,
                access_token: "tok".to_string(),
                created_at: now,
                last_login_at: now,
                is_registration_complete: complete,
                registration_completed_at: None,
                profile: ProfileDetails::default(),
            },
            is_new_user,
        }
    }

    #[test]
    fn test_new_user_goes_to_registration() {
        assert_eq!(
            redirect_target(BASE, &identity(true, false), None),
            "http://app.example/complete-registration?new=true"
        );
    }

    #[test]
    fn test_returning_incomplete_user_goes_to_registration_without_flag() {
        assert_eq!(
            redirect_target(BASE, &identity(false, false), None),
            "http://app.example/complete-registration"
        );
    }

    #[test]
    fn test_registered_user_goes_to_dashboard() {
        assert_eq!(
            redirect_target(BASE, &identity(false, true), None),
            "http://app.example/dashboard?login=success"
        );
    }

    #[test]
    fn test_relayed_redirect_embeds_token_and_user() {
        let grant = RelayGrant {
            token: "jwt.abc".to_string(),
            user: serde_json::json!({ "id": 7, "name": "Ada L" }),
            is_new_user: Some(false),
        };
        let target = redirect_target(BASE, &identity(false, true), Some(&grant));
        assert_eq!(
            target,
            "http://app.example/dashboard?login=success&token=jwt.abc&user=%7B%22id%22%3A7%2C%22name%22%3A%22Ada%20L%22%7D"
        );
    }

    #[test]
    fn test_backend_new_user_flag_takes_precedence() {
        let grant = RelayGrant {
            token: "t".to_string(),
            user: serde_json::Value::Null,
            is_new_user: Some(true),
        };
        let target = redirect_target(BASE, &identity(false, true), Some(&grant));
        assert!(target.starts_with("http://app.example/complete-registration?new=true&token=t"));
    }

    #[test]
    fn test_error_redirect_encodes_message() {
        assert_eq!(
            error_redirect(BASE, DEFAULT_FAILURE_MESSAGE),
            "http://app.example/auth/error?message=Authentication%20failed"
        );
    }

    #[test]
    fn test_relay_message_is_surfaced() {
        let err = CallbackError::BackendRelayFailed(RelayError::Rejected {
            message: Some("Account locked".to_string()),
        });
        assert_eq!(err.user_message(), "Account locked");
        let timeout = CallbackError::BackendRelayFailed(RelayError::Timeout);
        assert_eq!(timeout.user_message(), DEFAULT_FAILURE_MESSAGE);
    }
}
