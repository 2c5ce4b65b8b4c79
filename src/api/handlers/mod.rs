//! Handlers module
//!
//! HTTP request handlers.

pub mod auth_handler;
pub mod chat_handler;
pub mod history_handler;
pub mod notification_handler;
pub mod otp_handler;
pub mod reminder_handler;

pub use auth_handler::*;
pub use chat_handler::*;
pub use history_handler::*;
pub use notification_handler::*;
pub use otp_handler::*;
pub use reminder_handler::*;
