use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    #[default]
    Sms,
    Email,
    Push,
}

/// Notification addressed to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub channel: NotificationChannel,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub provider_sid: Option<String>,
    /// Last delivery status reported by the provider
    pub provider_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: &str, title: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            channel: NotificationChannel::Sms,
            sent: false,
            sent_at: None,
            read: false,
            read_at: None,
            provider_sid: None,
            provider_status: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sms_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    pub fn mark_sent(&mut self, provider_sid: &str, now: DateTime<Utc>) {
        self.sent = true;
        self.sent_at = Some(now);
        self.provider_sid = Some(provider_sid.to_string());
        self.updated_at = now;
    }

    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.read = true;
        self.read_at = Some(now);
        self.updated_at = now;
    }
}

impl Entity for Notification {
    const TABLE: &'static str = "notification";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
