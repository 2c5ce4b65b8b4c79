use axum::{
    Json,
    extract::{Extension, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::ChatRequest},
    error::AppError,
    security::auth::Claims,
};

pub async fn chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = request
        .message
        .ok_or_else(|| AppError::Validation("Message non fourni".to_string()))?;
    debug!(user_id = %claims.sub, "Chat message received");

    let reply = state.chat_service.send_message(&claims.sub, &message).await?;
    Ok(Json(reply))
}

/// The caller's chat messages, oldest first
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.chat_service.history(&claims.sub).await?;
    Ok(Json(messages))
}
