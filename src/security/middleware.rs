//! Security Middleware Module
//!
//! Axum middleware for bearer authentication, request size limits, CORS and
//! security headers.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use std::result::Result as StdResult;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::debug;

use crate::error::AppError;
use crate::security::auth::{Claims, JwtAuth, bearer_token};

/// Extension trait for adding claims to request extensions
pub trait RequestClaimsExt {
    fn claims(&self) -> Option<&Claims>;
    fn set_claims(&mut self, claims: Claims);
}

impl RequestClaimsExt for Request<Body> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }

    fn set_claims(&mut self, claims: Claims) {
        self.extensions_mut().insert(claims);
    }
}

/// Authentication middleware
///
/// Requires a valid, unrevoked bearer token and stores its [`Claims`] in the
/// request extensions.
pub async fn auth_middleware(
    State(jwt): State<JwtAuth>,
    mut req: Request<Body>,
    next: Next,
) -> StdResult<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = bearer_token(header_value)
        .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;
    let claims = jwt.validate_token(token)?;
    debug!(user_id = %claims.sub, "Request authenticated");

    req.set_claims(claims);
    Ok(next.run(req).await)
}

/// Reject bodies whose declared length exceeds the limit
pub async fn body_size_middleware(
    State(max_body_size): State<usize>,
    req: Request<Body>,
    next: Next,
) -> StdResult<Response, AppError> {
    if matches!(req.method(), &Method::POST | &Method::PUT | &Method::PATCH) {
        let declared = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());

        if let Some(size) = declared {
            if size > max_body_size {
                return Err(AppError::Validation(format!(
                    "Request body too large: {} bytes (max {})",
                    size, max_body_size
                )));
            }
        }
    }

    Ok(next.run(req).await)
}

/// Abort requests that run longer than the limit
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    req: Request<Body>,
    next: Next,
) -> StdResult<Response, AppError> {
    tokio::time::timeout(limit, next.run(req))
        .await
        .map_err(|_| AppError::Internal(format!("Request timed out after {:?}", limit)))
}

/// Security headers middleware
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'self'"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// CORS layer for the configured origins; an empty list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use chrono::Utc;
    use tower::ServiceExt;

    fn app(jwt: JwtAuth) -> Router {
        Router::new()
            .route(
                "/me",
                get(|Extension(claims): Extension<Claims>| async move { claims.sub }),
            )
            .layer(middleware::from_fn_with_state(jwt, auth_middleware))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/me");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_passes_claims() {
        let jwt = JwtAuth::development();
        let token = jwt.issue("user-1", Role::User, Utc::now()).unwrap();

        let response = app(jwt).oneshot(request(Some(&token.token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["X-Frame-Options"], "DENY");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"user-1");
    }

    #[tokio::test]
    async fn test_missing_or_revoked_token_is_401() {
        let jwt = JwtAuth::development();
        let response = app(jwt.clone()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = jwt.issue("user-1", Role::User, Utc::now()).unwrap();
        let claims = jwt.validate_token(&token.token).unwrap();
        jwt.revoke(&claims, Utc::now());

        let response = app(jwt).oneshot(request(Some(&token.token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let app = Router::new()
            .route("/echo", axum::routing::post(|body: String| async move { body }))
            .layer(middleware::from_fn_with_state(8usize, body_size_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .header(header::CONTENT_LENGTH, "20")
                    .body(Body::from("x".repeat(20)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
