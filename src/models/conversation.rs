use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chatbot::DialogueState;
use crate::storage::repository::Entity;

/// Dialogue state of one user's conversation, keyed by user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    pub user_id: String,
    pub state: DialogueState,
    /// Timestamp of the latest stored message, user or bot
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(
        user_id: &str,
        state: DialogueState,
        last_message_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: user_id.to_string(),
            user_id: user_id.to_string(),
            state,
            last_message_at: Some(last_message_at),
            updated_at: now,
        }
    }
}

impl Entity for ConversationState {
    const TABLE: &'static str = "conversation_state";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
