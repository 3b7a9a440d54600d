//! Common test utilities for gateway integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use clap::Parser;
use gateway::auth::provider::{IdentityProvider, ProviderError};
use gateway::auth::types::{IdentityClaim, ProfileEmail, ProviderGrant, ProviderProfile};
use gateway::relay::{BackendRelay, RelayError, RelayGrant};
use gateway::{create_router, AppState, GatewayConfig};
use serde_json::Value;
use tower::ServiceExt;

pub const FRONTEND: &str = "http://app.test";

pub fn test_config(extra: &[&str]) -> GatewayConfig {
    let mut args = vec![
        "gateway",
        "--google-client-id",
        "test-client",
        "--google-client-secret",
        "test-secret",
        "--session-secret",
        "test-session-secret",
        "--frontend-url",
        FRONTEND,
    ];
    if !extra.contains(&"--environment") {
        args.extend_from_slice(&["--environment", "test"]);
    }
    args.extend_from_slice(extra);
    GatewayConfig::try_parse_from(args).expect("test config should parse")
}

/// Identity provider that treats the authorization code as the provider id
/// of a registered profile.
#[derive(Default, Clone)]
pub struct FakeProvider {
    profiles: Arc<RwLock<HashMap<String, ProviderProfile>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, provider_id: &str, email: &str) -> Self {
        self.profiles.write().unwrap().insert(
            provider_id.to_string(),
            ProviderProfile {
                id: provider_id.to_string(),
                emails: vec![ProfileEmail {
                    value: email.to_string(),
                    verified: true,
                }],
                display_name: Some(format!("User {}", provider_id)),
                photos: vec![],
            },
        );
        self
    }

    pub fn with_profile(self, code: &str, profile: ProviderProfile) -> Self {
        self.profiles
            .write()
            .unwrap()
            .insert(code.to_string(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://provider.test/auth?state={}", state)
    }

    async fn exchange(&self, code: &str) -> Result<ProviderGrant, ProviderError> {
        let profile = self
            .profiles
            .read()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| ProviderError::TokenExchange("invalid_grant".to_string()))?;
        Ok(ProviderGrant {
            access_token: format!("access-{}", code),
            profile,
        })
    }
}

#[derive(Clone)]
pub enum RelayBehavior {
    Succeed { token: String, is_new_user: Option<bool> },
    Timeout,
    Reject(Option<String>),
}

/// Backend relay with scripted behavior that records what it was sent.
#[derive(Clone)]
pub struct FakeRelay {
    behavior: RelayBehavior,
    pub calls: Arc<AtomicUsize>,
    pub last_claim: Arc<RwLock<Option<IdentityClaim>>>,
}

impl FakeRelay {
    pub fn new(behavior: RelayBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            last_claim: Arc::new(RwLock::new(None)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendRelay for FakeRelay {
    async fn relay(&self, claim: &IdentityClaim) -> Result<RelayGrant, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_claim.write().unwrap() = Some(claim.clone());
        match &self.behavior {
            RelayBehavior::Succeed { token, is_new_user } => Ok(RelayGrant {
                token: token.clone(),
                user: serde_json::json!({ "email": claim.email }),
                is_new_user: *is_new_user,
            }),
            RelayBehavior::Timeout => Err(RelayError::Timeout),
            RelayBehavior::Reject(message) => Err(RelayError::Rejected {
                message: message.clone(),
            }),
        }
    }
}

/// App state with a fake provider and no relay.
pub fn test_state(provider: FakeProvider) -> AppState {
    AppState::from_config(test_config(&[])).with_provider(Arc::new(provider))
}

pub fn create_test_app(provider: FakeProvider) -> (Router, AppState) {
    let state = test_state(provider);
    (create_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub fn get(uri: &str, cookies: &[(&str, &str)]) -> Request<Body> {
    request("GET", uri, cookies, Body::empty())
}

pub fn post_json(uri: &str, cookies: &[(&str, &str)], body: Value) -> Request<Body> {
    let mut req = request("POST", uri, cookies, Body::from(body.to_string()));
    req.headers_mut().insert(
        header::CONTENT_TYPE,
        "application/json".parse().unwrap(),
    );
    req
}

pub fn request(method: &str, uri: &str, cookies: &[(&str, &str)], body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !cookies.is_empty() {
        let header_value = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(header::COOKIE, header_value);
    }
    builder.body(body).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location")
        .to_str()
        .unwrap()
        .to_string()
}

/// Value of a cookie set by the response, if any. Cleared cookies come back
/// as empty strings.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| cookie::Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

pub struct LoginResult {
    pub location: String,
    pub session_cookie: Option<String>,
}

/// Run the full login flow: start, then call back with `code`.
pub async fn login(app: &Router, code: &str) -> LoginResult {
    let start = send(app, get("/auth/google", &[])).await;
    let state = set_cookie(&start, "oauth_state").expect("login should set oauth_state");

    let callback = send(
        app,
        get(
            &format!("/auth/google/callback?code={}&state={}", code, state),
            &[("oauth_state", &state)],
        ),
    )
    .await;
    assert!(callback.status().is_redirection());

    LoginResult {
        location: location(&callback),
        session_cookie: set_cookie(&callback, "gateway_session").filter(|v| !v.is_empty()),
    }
}
