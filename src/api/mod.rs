//! API module
//!
//! JSON REST API under `/api/v1`. Registration, login and OTP routes are
//! public; every other route requires a bearer token.

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;
use crate::observability::{ObservabilityState, create_observability_router, metrics_middleware};
use crate::security::middleware::{
    auth_middleware, body_size_middleware, cors_layer, security_headers_middleware,
    timeout_middleware,
};

pub fn create_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::auth_routes::create_auth_router())
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::sms_routes::create_sms_router())
        .route_layer(from_fn_with_state(app_state.jwt.clone(), auth_middleware));

    let api = Router::new()
        .merge(routes::auth_routes::create_public_auth_router())
        .merge(routes::otp_routes::create_otp_router())
        .merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .layer(from_fn_with_state(app_state.request_timeout, timeout_middleware))
        .layer(from_fn_with_state(app_state.max_request_size, body_size_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn_with_state(app_state.metrics.clone(), metrics_middleware))
        .layer(cors_layer(&app_state.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// API routes merged with the health and metrics endpoints
pub fn create_app(app_state: AppState, observability: Arc<ObservabilityState>) -> Router {
    create_observability_router(observability).merge(create_router(app_state))
}
