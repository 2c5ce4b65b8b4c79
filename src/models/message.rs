use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

/// One side of a chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub content: String,
    /// `false` for bot replies
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(user_id: &str, content: &str, is_from_user: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            is_from_user,
            created_at: now,
        }
    }

    pub fn from_user(user_id: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self::new(user_id, content, true, now)
    }

    pub fn from_bot(user_id: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self::new(user_id, content, false, now)
    }
}

impl Entity for Message {
    const TABLE: &'static str = "message";

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
