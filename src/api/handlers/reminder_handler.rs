use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::reminder_dto::*},
    error::AppError,
    security::auth::Claims,
    services::reminder::REMINDER_CREATED,
};

pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Creating reminder: {:?}", request.title);

    let reminder = state.reminder_service.create(&claims.sub, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateReminderResponse {
            success: true,
            reminder_id: reminder.id,
            message: REMINDER_CREATED.to_string(),
        }),
    ))
}

pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let reminders: Vec<ReminderResponse> = state
        .reminder_service
        .list(&claims.sub)
        .await?
        .into_iter()
        .map(ReminderResponse::from)
        .collect();
    Ok(Json(reminders))
}

pub async fn send_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let delivery = state.reminder_service.send(&claims.sub, &id).await?;
    Ok(Json(delivery))
}
