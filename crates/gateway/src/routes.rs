use std::any::Any;

use axum::{
    http::{header, HeaderValue, Method, Response, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::{CatchPanicLayer, ResponseForPanic},
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth;
use crate::config::GatewayConfig;
use crate::error::ErrorResponse;
use crate::handlers;
use crate::AppState;

/// Create the router with all routes.
///
/// Routes fall into three tiers: public, authenticated (active session), and
/// registration-complete (active session of a fully registered user).
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route(
            "/auth/complete-registration",
            post(auth::complete_registration),
        )
        .route("/auth/registration-status", get(auth::registration_status))
        .route("/api/basic-profile", get(handlers::basic_profile))
        .route("/api/users", get(handlers::list_users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let registered = Router::new()
        .route("/api/profile", get(handlers::profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_registration,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/status", get(auth::auth_status))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/failure", get(auth::auth_failure))
        .merge(authenticated)
        .merge(registered)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(PanicResponder {
            expose_details: !state.config.is_production(),
        }))
        .layer(build_cors_layer(&state.config))
        .with_state(state)
}

/// Turns a handler panic into a 500 JSON body. The panic message is only
/// included outside production.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    pub expose_details: bool,
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> Response<Self::ResponseBody> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "Unknown panic message".to_string()
        };
        tracing::error!("Handler panicked: {}", detail);

        let body = ErrorResponse::new("InternalError", self.expose_details.then_some(detail));
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Build the CORS layer: the configured frontend origin, with credentials.
fn build_cors_layer(config: &GatewayConfig) -> CorsLayer {
    match config.frontend_base().parse::<HeaderValue>() {
        Ok(origin) => {
            tracing::info!("CORS configured for origin: {:?}", origin);
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
        Err(e) => {
            tracing::warn!(
                "FRONTEND_URL is not a valid origin ({}), cross-origin requests will be refused",
                e
            );
            CorsLayer::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn panic_body(expose_details: bool) -> (StatusCode, serde_json::Value) {
        let mut responder = PanicResponder { expose_details };
        let response = responder.response_for_panic(Box::new("boom"));
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_panic_details_shown_in_development() {
        let (status, body) = panic_body(true).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "InternalError");
        assert_eq!(body["details"], "boom");
    }

    #[tokio::test]
    async fn test_panic_details_hidden_in_production() {
        let (_, body) = panic_body(false).await;
        assert!(body.get("details").is_none());
    }
}
