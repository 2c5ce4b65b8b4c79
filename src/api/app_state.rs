use std::sync::Arc;
use std::time::Duration;

use crate::chatbot::Chatbot;
use crate::clock::Clock;
use crate::config::config::AppConfig;
use crate::observability::AppMetrics;
use crate::security::auth::JwtAuth;
use crate::security::rate_limit::RateLimiter;
use crate::services::{
    AuthService, ChatService, HistoryService, NotificationService, OtpService, ReminderService,
    create_auth_service, create_chat_service, create_history_service,
    create_notification_service, create_otp_service, create_reminder_service,
};
use crate::sms::SmsSender;
use crate::storage::Repositories;

/// Application state containing all shared services and security components
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    /// Chat turns and per-user dialogue state
    pub chat_service: Arc<dyn ChatService>,
    pub history_service: Arc<dyn HistoryService>,
    pub otp_service: Arc<dyn OtpService>,
    pub reminder_service: Arc<dyn ReminderService>,
    pub notification_service: Arc<dyn NotificationService>,
    /// Token issuer and validator, shared with the auth middleware
    pub jwt: JwtAuth,
    pub metrics: Arc<AppMetrics>,
    pub max_request_size: usize,
    pub request_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth_service", &"Arc<dyn AuthService>")
            .field("chat_service", &"Arc<dyn ChatService>")
            .field("history_service", &"Arc<dyn HistoryService>")
            .field("otp_service", &"Arc<dyn OtpService>")
            .field("reminder_service", &"Arc<dyn ReminderService>")
            .field("notification_service", &"Arc<dyn NotificationService>")
            .field("jwt", &self.jwt)
            .field("max_request_size", &self.max_request_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppState {
    /// Wire every service over one set of repositories.
    pub fn new(
        config: &AppConfig,
        repositories: &Repositories,
        chatbot: Arc<Chatbot>,
        sms: Arc<dyn SmsSender>,
        metrics: Arc<AppMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let jwt = JwtAuth::from_config(&config.security).with_clock(clock.clone());

        Self {
            auth_service: create_auth_service(
                repositories.users.clone(),
                jwt.clone(),
                clock.clone(),
            ),
            chat_service: create_chat_service(
                chatbot,
                repositories.messages.clone(),
                repositories.conversations.clone(),
                metrics.clone(),
                clock.clone(),
            ),
            history_service: create_history_service(repositories.history.clone(), clock.clone()),
            otp_service: create_otp_service(
                repositories.otps.clone(),
                repositories.users.clone(),
                sms.clone(),
                RateLimiter::per_hour(config.security.otp_requests_per_hour),
                config.otp.clone(),
                clock.clone(),
            ),
            reminder_service: create_reminder_service(
                repositories.reminders.clone(),
                repositories.users.clone(),
                sms.clone(),
                clock.clone(),
            ),
            notification_service: create_notification_service(
                repositories.notifications.clone(),
                repositories.users.clone(),
                sms,
                clock,
            ),
            jwt,
            metrics,
            max_request_size: config.server.max_request_size,
            request_timeout: Duration::from_secs(config.server.request_timeout),
            cors_allowed_origins: config.security.cors_allowed_origins.clone(),
        }
    }
}
