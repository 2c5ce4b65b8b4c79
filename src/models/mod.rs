//! Domain models
//!
//! Persisted records: accounts, chat messages, interaction history,
//! reminders, one-time passwords, notifications and dialogue state.

pub mod conversation;
pub mod history;
pub mod message;
pub mod notification;
pub mod otp;
pub mod reminder;
pub mod user;

pub use conversation::ConversationState;
pub use history::HistoryEntry;
pub use message::Message;
pub use notification::{Notification, NotificationChannel};
pub use otp::Otp;
pub use reminder::{Reminder, ReminderStatus};
pub use user::{Role, User};
