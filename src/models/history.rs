use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

/// Recorded interaction with its detected intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: String,
    pub user_message: String,
    pub bot_reply: String,
    pub detected_intent: Option<String>,
    /// Similarity score in [0, 1]
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        user_id: &str,
        user_message: &str,
        bot_reply: &str,
        detected_intent: Option<String>,
        confidence: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            user_message: user_message.to_string(),
            bot_reply: bot_reply.to_string(),
            detected_intent,
            confidence,
            created_at: now,
        }
    }
}

impl Entity for HistoryEntry {
    const TABLE: &'static str = "history";

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
