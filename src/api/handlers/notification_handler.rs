use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};

use crate::{
    api::{app_state::AppState, dto::notification_dto::*},
    error::AppError,
    security::auth::Claims,
};

fn title_and_content(title: Option<String>, content: Option<String>) -> Result<(String, String), AppError> {
    match (title, content) {
        (Some(title), Some(content)) if !title.trim().is_empty() && !content.trim().is_empty() => {
            Ok((title, content))
        }
        _ => Err(AppError::Validation("Titre et contenu requis".to_string())),
    }
}

pub async fn send_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (title, content) = title_and_content(request.title, request.content)?;

    let delivery = state
        .notification_service
        .send(&claims, request.user_id.as_deref(), &title, &content)
        .await?;
    Ok(Json(delivery))
}

pub async fn broadcast_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state
        .notification_service
        .broadcast(
            &claims,
            &request.user_ids,
            request.title.as_deref().unwrap_or_default(),
            request.content.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(summary))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let notifications: Vec<NotificationResponse> = state
        .notification_service
        .list(&claims.sub)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.notification_service.mark_read(&claims.sub, &id).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        message: "Notification marquée comme lue".to_string(),
    }))
}

pub async fn message_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(sid): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.notification_service.message_status(&claims, &sid).await?;
    Ok(Json(status))
}

pub async fn send_test_sms(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let delivery = state.notification_service.send_test(&claims).await?;
    Ok(Json(delivery))
}
