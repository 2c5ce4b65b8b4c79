//! SMS delivery
//!
//! [`SmsSender`] abstracts the provider. [`twilio::TwilioClient`] talks to
//! the Twilio REST API; [`DisabledSms`] stands in when no credentials are
//! configured and fails every call with `SmsUnavailable`.

pub mod twilio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::config::SmsConfig;
use crate::error::{AppError, Result};
use crate::observability::AppMetrics;

pub use twilio::TwilioClient;

/// Message accepted by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentMessage {
    pub sid: String,
    pub status: Option<String>,
}

/// Delivery status reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStatus {
    pub sid: String,
    pub status: String,
    pub price: Option<String>,
    pub date_sent: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send `body` to the E.164 number `to`.
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage>;

    async fn status(&self, sid: &str) -> Result<MessageStatus>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Sender used when the provider is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSms;

#[async_trait]
impl SmsSender for DisabledSms {
    async fn send(&self, _to: &str, _body: &str) -> Result<SentMessage> {
        Err(AppError::SmsUnavailable)
    }

    async fn status(&self, _sid: &str) -> Result<MessageStatus> {
        Err(AppError::SmsUnavailable)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Counts sent and failed messages around another sender
pub struct MeteredSms {
    inner: Arc<dyn SmsSender>,
    metrics: Arc<AppMetrics>,
}

impl MeteredSms {
    pub fn new(inner: Arc<dyn SmsSender>, metrics: Arc<AppMetrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl SmsSender for MeteredSms {
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage> {
        let result = self.inner.send(to, body).await;
        match &result {
            Ok(sent) => info!(sid = %sent.sid, "SMS sent"),
            Err(AppError::SmsUnavailable) => {}
            Err(e) => warn!(error = %e, "SMS send failed"),
        }
        if !matches!(result, Err(AppError::SmsUnavailable)) {
            self.metrics.record_sms(result.is_ok());
        }
        result
    }

    async fn status(&self, sid: &str) -> Result<MessageStatus> {
        self.inner.status(sid).await
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }
}

/// Build the sender for the configuration
pub fn create_sms_sender(config: &SmsConfig, metrics: Arc<AppMetrics>) -> Result<Arc<dyn SmsSender>> {
    let inner: Arc<dyn SmsSender> = if config.is_configured() {
        info!("SMS provider configured at {}", config.api_base_url);
        Arc::new(TwilioClient::from_config(config)?)
    } else {
        warn!("SMS provider not configured - OTP, reminders and notifications cannot be sent");
        Arc::new(DisabledSms)
    };
    Ok(Arc::new(MeteredSms::new(inner, metrics)))
}
