//! DTO module
//!
//! Request and response bodies of the HTTP API.

pub mod auth_dto;
pub mod chat_dto;
pub mod history_dto;
pub mod notification_dto;
pub mod otp_dto;
pub mod reminder_dto;

pub use auth_dto::*;
pub use chat_dto::*;
pub use history_dto::*;
pub use notification_dto::*;
pub use otp_dto::*;
pub use reminder_dto::*;
