//! Maternia - maternal and child health chatbot service
//!
//! A French-language assistant that matches questions against an intent
//! corpus with TF-IDF, computes pregnancy and vaccination calendars, and
//! sends OTP codes, reminders and notifications by SMS.

pub mod api;
pub mod chatbot;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod sms;
pub mod storage;
