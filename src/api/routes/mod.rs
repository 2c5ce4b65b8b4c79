//! Routes module
//!
//! API route tables.

pub mod auth_routes;
pub mod chat_routes;
pub mod otp_routes;
pub mod sms_routes;
