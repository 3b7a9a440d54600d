//! Google OAuth identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{ProfileEmail, ProviderGrant, ProviderProfile};
use crate::config::GatewayConfig;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "profile email";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to get user info: {0}")]
    UserInfo(String),
}

/// Capability consumed from the identity provider: build the authorization
/// redirect, and exchange an authorization code for a verified profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange(&self, code: &str) -> Result<ProviderGrant, ProviderError>;
}

pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleProvider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_callback_url.clone(),
        )
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl From<GoogleUserInfo> for ProviderProfile {
    fn from(info: GoogleUserInfo) -> Self {
        ProviderProfile {
            id: info.id,
            emails: info
                .email
                .map(|value| ProfileEmail {
                    value,
                    verified: info.verified_email,
                })
                .into_iter()
                .collect(),
            display_name: info.name,
            photos: info.picture.into_iter().collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            AUTHORIZATION_ENDPOINT,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    async fn exchange(&self, code: &str) -> Result<ProviderGrant, ProviderError> {
        let token_response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&TokenRequest {
                code,
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                redirect_uri: &self.redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        if !token_response.status().is_success() {
            let status = token_response.status();
            let body = token_response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed: {} - {}", status, body);
            return Err(ProviderError::TokenExchange(format!("status {}", status)));
        }

        let tokens: GoogleTokenResponse = token_response
            .json()
            .await
            .map_err(|e| ProviderError::TokenExchange(format!("invalid token response: {}", e)))?;

        let user_info: GoogleUserInfo = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?
            .error_for_status()
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(format!("invalid user info response: {}", e)))?;

        Ok(ProviderGrant {
            access_token: tokens.access_token,
            profile: user_info.into(),
        })
    }
}
