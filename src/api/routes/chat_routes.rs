//! Chat routes

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::chat_handler::*;
use crate::api::handlers::history_handler::*;

pub fn create_chat_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/history", get(chat_history))
        .route("/history", post(record_history).get(list_history))
}
