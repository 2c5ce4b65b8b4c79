//! Services
//!
//! Business operations behind the HTTP handlers. Each service is a trait
//! with one implementation and a `create_*` constructor returning it behind
//! an `Arc`.

pub mod auth;
pub mod chat;
pub mod history;
pub mod notification;
pub mod otp;
pub mod reminder;

pub use auth::{AuthService, AuthSession, Registration, UserProfile, create_auth_service};
pub use chat::{ChatMessageView, ChatReply, ChatService, create_chat_service};
pub use history::{
    HistoryPage, HistoryService, NewHistoryEntry, Pagination, create_history_service,
};
pub use notification::{
    BroadcastSummary, DeliveryStatus, NotificationDelivery, NotificationService,
    create_notification_service,
};
pub use otp::{OtpSent, OtpService, OtpVerification, create_otp_service};
pub use reminder::{NewReminder, ReminderDelivery, ReminderService, create_reminder_service};
