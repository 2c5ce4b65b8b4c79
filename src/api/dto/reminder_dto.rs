//! Reminder DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Reminder, ReminderStatus};

pub use crate::services::NewReminder as CreateReminderRequest;

#[derive(Debug, Serialize)]
pub struct CreateReminderResponse {
    pub success: bool,
    pub reminder_id: String,
    pub message: String,
}

/// Reminder as listed to its owner
#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Reminder> for ReminderResponse {
    fn from(reminder: Reminder) -> Self {
        Self {
            id: reminder.id,
            title: reminder.title,
            description: reminder.description,
            remind_at: reminder.remind_at,
            status: reminder.status,
            created_at: reminder.created_at,
        }
    }
}
