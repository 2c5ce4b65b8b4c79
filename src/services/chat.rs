//! Chat service
//!
//! Runs one conversation turn per request: the user message is stored, the
//! chatbot answers from the user's stored dialogue state, and the reply and
//! the new state are stored. Turns of the same user are serialized.

use async_trait::async_trait;
use chrono::Duration;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::chatbot::{Chatbot, DialogueState, ReplyKind};
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::{ConversationState, Message};
use crate::observability::AppMetrics;
use crate::storage::repository::{Repository, SortOrder};

pub const EMPTY_MESSAGE: &str = "Message vide";

/// Answer to one chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
}

/// Stored message as shown in the chat window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessageView {
    pub content: String,
    /// `%Y-%m-%d %H:%M:%S`, UTC
    pub timestamp: String,
    pub is_from_user: bool,
}

impl From<&Message> for ChatMessageView {
    fn from(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            timestamp: message.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            is_from_user: message.is_from_user,
        }
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Answer a user message.
    async fn send_message(&self, user_id: &str, message: &str) -> Result<ChatReply>;

    /// All messages of a user, oldest first.
    async fn history(&self, user_id: &str) -> Result<Vec<ChatMessageView>>;

    async fn dialogue_state(&self, user_id: &str) -> Result<DialogueState>;
}

pub struct ChatServiceImpl {
    chatbot: Arc<Chatbot>,
    messages: Arc<dyn Repository<Message>>,
    conversations: Arc<dyn Repository<ConversationState>>,
    metrics: Arc<AppMetrics>,
    clock: Arc<dyn Clock>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ChatServiceImpl {
    pub fn new(
        chatbot: Arc<Chatbot>,
        messages: Arc<dyn Repository<Message>>,
        conversations: Arc<dyn Repository<ConversationState>>,
        metrics: Arc<AppMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chatbot,
            messages,
            conversations,
            metrics,
            clock,
            user_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop the user's lock once no turn holds or waits on it.
    fn release_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.user_locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn run_turn(&self, user_id: &str, message: &str) -> Result<ChatReply> {
        let conversation = self.conversations.get_by_id(user_id).await?;
        let state = conversation
            .as_ref()
            .map(|conversation| conversation.state)
            .unwrap_or_default();

        // Every message sorts after the previous one even on a frozen clock
        let now = self.clock.now();
        let sent_at = match conversation.and_then(|c| c.last_message_at) {
            Some(last) => now.max(last + Duration::microseconds(1)),
            None => now,
        };
        self.messages
            .create(&Message::from_user(user_id, message, sent_at))
            .await?;

        let reply = self.chatbot.respond(message, state, self.clock.today());
        debug!(user_id, ?state, next = ?reply.state, "Chat turn");

        let replied_at = now.max(sent_at + Duration::microseconds(1));
        self.messages
            .create(&Message::from_bot(user_id, &reply.text, replied_at))
            .await?;
        self.conversations
            .upsert(&ConversationState::new(user_id, reply.state, replied_at, now))
            .await?;

        self.metrics
            .record_chat_turn(matches!(reply.kind, ReplyKind::Fallback { .. }));

        Ok(ChatReply {
            intent: reply.intent().map(str::to_string),
            confidence: reply.confidence(),
            response: reply.text,
        })
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn send_message(&self, user_id: &str, message: &str) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation(EMPTY_MESSAGE.to_string()));
        }

        let lock = self.lock_for(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(user_id, message).await
        };
        self.release_lock(user_id, lock);
        result
    }

    async fn history(&self, user_id: &str) -> Result<Vec<ChatMessageView>> {
        let messages = self
            .messages
            .list_all_by_owner(user_id, SortOrder::Ascending)
            .await?;
        Ok(messages.iter().map(ChatMessageView::from).collect())
    }

    async fn dialogue_state(&self, user_id: &str) -> Result<DialogueState> {
        Ok(self
            .conversations
            .get_by_id(user_id)
            .await?
            .map(|conversation| conversation.state)
            .unwrap_or_default())
    }
}

pub fn create_chat_service(
    chatbot: Arc<Chatbot>,
    messages: Arc<dyn Repository<Message>>,
    conversations: Arc<dyn Repository<ConversationState>>,
    metrics: Arc<AppMetrics>,
    clock: Arc<dyn Clock>,
) -> Arc<dyn ChatService> {
    Arc::new(ChatServiceImpl::new(
        chatbot,
        messages,
        conversations,
        metrics,
        clock,
    ))
}
