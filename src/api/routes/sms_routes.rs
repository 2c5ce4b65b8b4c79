//! Reminder, notification and SMS routes

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::app_state::AppState;
use crate::api::handlers::notification_handler::*;
use crate::api::handlers::reminder_handler::*;

pub fn create_sms_router() -> Router<AppState> {
    Router::new()
        .route("/reminders", post(create_reminder).get(list_reminders))
        .route("/reminders/:id/send", post(send_reminder))
        .route("/notifications", get(list_notifications))
        .route("/notifications/send", post(send_notification))
        .route("/notifications/broadcast", post(broadcast_notification))
        .route("/notifications/:id/read", put(mark_notification_read))
        .route("/sms/test", post(send_test_sms))
        .route("/sms/:sid/status", get(message_status))
}
