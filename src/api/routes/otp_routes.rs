//! OTP routes; callers are not yet signed in

use axum::{Router, routing::post};

use crate::api::app_state::AppState;
use crate::api::handlers::otp_handler::*;

pub fn create_otp_router() -> Router<AppState> {
    Router::new()
        .route("/otp/send", post(send_otp))
        .route("/otp/verify", post(verify_otp))
}
