//! Notification DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Notification;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendNotificationRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Recipient; defaults to the caller
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BroadcastRequest {
    pub user_ids: Vec<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub sent: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title,
            content: notification.content,
            sent: notification.sent,
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: String,
}
