//! The HTTP backend relay against a live local backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use common::*;
use gateway::auth::types::IdentityClaim;
use gateway::relay::RelayError;
use gateway::{create_router, BackendRelay, HttpBackendRelay};
use serde_json::{json, Value};

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn claim() -> IdentityClaim {
    IdentityClaim {
        provider_id: "g-1".to_string(),
        email: "a@x.com".to_string(),
        display_name: "Ada".to_string(),
        picture_url: None,
        access_token: "tok".to_string(),
    }
}

#[tokio::test]
async fn test_relay_posts_claim_and_reads_grant() {
    let backend = Router::new().route(
        "/api/auth/google-callback",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["googleId"], "g-1");
            assert_eq!(body["accessToken"], "tok");
            Json(json!({
                "success": true,
                "token": "backend-jwt",
                "user": { "email": body["email"] },
                "isNewUser": false
            }))
        }),
    );
    let url = spawn_backend(backend).await;

    let relay = HttpBackendRelay::new(&url, Duration::from_secs(5));
    let grant = relay.relay(&claim()).await.unwrap();

    assert_eq!(grant.token, "backend-jwt");
    assert_eq!(grant.user["email"], "a@x.com");
    assert_eq!(grant.is_new_user, Some(false));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = Router::new().route(
        "/api/auth/google-callback",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "token": "late" }))
        }),
    );
    let url = spawn_backend(backend).await;

    let relay = HttpBackendRelay::new(&url, Duration::from_millis(100));
    let err = relay.relay(&claim()).await.unwrap_err();

    assert!(matches!(err, RelayError::Timeout), "got {:?}", err);
}

#[tokio::test]
async fn test_error_status_surfaces_backend_message() {
    let backend = Router::new().route(
        "/api/auth/google-callback",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "success": false, "message": "Account suspended" })),
            )
        }),
    );
    let url = spawn_backend(backend).await;

    let relay = HttpBackendRelay::new(&url, Duration::from_secs(5));
    let err = relay.relay(&claim()).await.unwrap_err();

    assert_eq!(err.backend_message(), Some("Account suspended"));
}

#[tokio::test]
async fn test_slow_backend_fails_the_whole_login() {
    let backend = Router::new().route(
        "/api/auth/google-callback",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "token": "late" }))
        }),
    );
    let url = spawn_backend(backend).await;

    let relay = HttpBackendRelay::new(&url, Duration::from_millis(100));
    let state = test_state(FakeProvider::new().with_user("g-1", "a@x.com"))
        .with_relay(Some(Arc::new(relay)));
    let app = create_router(state.clone());

    let login = login(&app, "g-1").await;

    assert_eq!(
        login.location,
        format!("{}/auth/error?message=Authentication%20failed", FRONTEND)
    );
    assert!(login.session_cookie.is_none());
}
