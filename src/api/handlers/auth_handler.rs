use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::auth_dto::*},
    error::AppError,
    security::auth::Claims,
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Registering user: {:?}", request.username);

    let session = state.auth_service.register(request.into()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&claims).await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "Déconnexion réussie".to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.auth_service.current_user(&claims.sub).await?;
    Ok(Json(profile))
}
