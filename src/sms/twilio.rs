use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{MessageStatus, SentMessage, SmsSender};
use crate::config::config::SmsConfig;
use crate::error::{AppError, Result};

/// Twilio REST API client
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    status: Option<String>,
    price: Option<String>,
    date_sent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    code: Option<i64>,
    message: String,
}

impl TwilioClient {
    pub fn new(
        base_url: &str,
        account_sid: &str,
        auth_token: &str,
        from_number: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
        })
    }

    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        let (Some(sid), Some(token)) = (&config.account_sid, &config.auth_token) else {
            return Err(AppError::SmsUnavailable);
        };
        Self::new(
            &config.api_base_url,
            sid,
            token,
            config.from_number.as_deref().unwrap_or_default(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }

    fn message_url(&self, sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages/{}.json",
            self.base_url, self.account_sid, sid
        )
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TwilioError>(&text) {
            Ok(TwilioError {
                code: Some(code),
                message,
            }) => format!("{} (code {})", message, code),
            Ok(TwilioError { message, .. }) => message,
            Err(_) if status == StatusCode::UNAUTHORIZED => "invalid credentials".to_string(),
            Err(_) => format!("provider returned {}", status),
        };
        Err(AppError::Sms(message))
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage> {
        debug!(to, "Sending SMS");
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let message: TwilioMessage = Self::parse(response).await?;
        Ok(SentMessage {
            sid: message.sid,
            status: message.status,
        })
    }

    async fn status(&self, sid: &str) -> Result<MessageStatus> {
        let response = self
            .http
            .get(self.message_url(sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let message: TwilioMessage = Self::parse(response).await?;
        Ok(MessageStatus {
            sid: message.sid,
            status: message.status.unwrap_or_else(|| "unknown".to_string()),
            price: message.price,
            date_sent: message.date_sent,
        })
    }
}
