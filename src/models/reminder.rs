use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

/// Reminder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Sent,
    Snoozed,
    Completed,
}

/// Reminder delivered by SMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub status: ReminderStatus,
    /// Destination; falls back to the owner's number when absent
    pub phone_number: Option<String>,
    pub sms_body: Option<String>,
    pub provider_sid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(
        user_id: &str,
        title: &str,
        description: Option<String>,
        remind_at: DateTime<Utc>,
        phone_number: Option<String>,
        sms_body: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let sms_body = sms_body
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| format!("Rappel: {}", title));
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description,
            remind_at,
            status: ReminderStatus::Pending,
            phone_number,
            sms_body: Some(sms_body),
            provider_sid: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text sent by SMS.
    pub fn sms_text(&self) -> String {
        match &self.sms_body {
            Some(body) if !body.is_empty() => body.clone(),
            _ => format!(
                "Rappel : {}\n{}",
                self.title,
                self.description.as_deref().unwrap_or_default()
            ),
        }
    }

    pub fn mark_sent(&mut self, provider_sid: &str, now: DateTime<Utc>) {
        self.status = ReminderStatus::Sent;
        self.provider_sid = Some(provider_sid.to_string());
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = ReminderStatus::Completed;
        self.updated_at = now;
    }
}

impl Entity for Reminder {
    const TABLE: &'static str = "reminder";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.remind_at
    }
}
