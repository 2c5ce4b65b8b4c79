use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    api::{app_state::AppState, dto::otp_dto::*},
    error::AppError,
};

fn missing_data() -> AppError {
    AppError::Validation("Données manquantes".to_string())
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(phone_number), Some(user_id)) = (request.phone_number, request.user_id) else {
        return Err(missing_data());
    };

    let sent = state.otp_service.send(&user_id, &phone_number).await?;
    Ok(Json(sent))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(user_id), Some(code)) = (request.user_id, request.code) else {
        return Err(missing_data());
    };

    let verification = state.otp_service.verify(&user_id, &code).await?;
    Ok(Json(verification))
}
