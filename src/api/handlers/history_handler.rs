use axum::{
    Json,
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    api::{app_state::AppState, dto::history_dto::*},
    error::AppError,
    security::{auth::Claims, validation::RequestValidator},
    services::{NewHistoryEntry, Pagination},
};

const MAX_PER_PAGE: u64 = 100;

pub async fn record_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RecordHistoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_message = RequestValidator::required("user_message", request.user_message.as_deref())?;
    let bot_reply = RequestValidator::required("bot_reply", request.bot_reply.as_deref())?;

    let entry = state
        .history_service
        .record(
            &claims.sub,
            NewHistoryEntry {
                user_message: user_message.to_string(),
                bot_reply: bot_reply.to_string(),
                detected_intent: request.detected_intent,
                confidence: request.confidence,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordHistoryResponse {
            success: true,
            id: entry.id,
        }),
    ))
}

pub async fn list_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) =
        RequestValidator::validate_pagination(params.page, params.per_page, MAX_PER_PAGE)?;

    let page = state
        .history_service
        .list(&claims.sub, Pagination::new(page, per_page))
        .await?;
    Ok(Json(page))
}
