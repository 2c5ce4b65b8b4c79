//! One-time password service
//!
//! Codes are sent by SMS to confirm a user's phone number. Sends are rate
//! limited per destination number.

use async_trait::async_trait;
use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::config::OtpConfig;
use crate::error::{AppError, Result};
use crate::models::{Otp, User};
use crate::security::rate_limit::{RateLimitClient, RateLimitResult, RateLimiter};
use crate::security::validation::RequestValidator;
use crate::sms::SmsSender;
use crate::storage::repository::Repository;

pub const OTP_SENT: &str = "OTP envoyé avec succès";
pub const OTP_INVALID: &str = "Code OTP invalide";
pub const OTP_EXPIRED: &str = "Code OTP expiré";
pub const OTP_VERIFIED: &str = "Code OTP vérifié avec succès";

/// Result of a send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpSent {
    pub success: bool,
    pub otp_id: String,
    pub message: String,
    pub expires_in: i64,
}

/// Result of a verification; failures are answers, not errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpVerification {
    pub valid: bool,
    pub message: String,
}

impl OtpVerification {
    fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait OtpService: Send + Sync {
    /// Generate a code for `user_id` and text it to `phone_number`.
    async fn send(&self, user_id: &str, phone_number: &str) -> Result<OtpSent>;

    /// Check a code; on success the user's phone is marked verified.
    async fn verify(&self, user_id: &str, code: &str) -> Result<OtpVerification>;
}

pub struct OtpServiceImpl {
    otps: Arc<dyn Repository<Otp>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    rate_limiter: RateLimiter,
    /// Verification attempts per user
    attempt_limiter: RateLimiter,
    config: OtpConfig,
    clock: Arc<dyn Clock>,
}

impl OtpServiceImpl {
    pub fn new(
        otps: Arc<dyn Repository<Otp>>,
        users: Arc<dyn Repository<User>>,
        sms: Arc<dyn SmsSender>,
        rate_limiter: RateLimiter,
        config: OtpConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let attempt_limiter =
            RateLimiter::new(config.max_attempts, Duration::minutes(config.ttl_minutes));
        Self {
            otps,
            users,
            sms,
            rate_limiter,
            attempt_limiter,
            config,
            clock,
        }
    }

    fn message_for(&self, code: &str) -> String {
        format!(
            "Votre code OTP est : {}\nValide pendant {} minutes.",
            code, self.config.ttl_minutes
        )
    }

    async fn mark_phone_verified(&self, user_id: &str) -> Result<()> {
        match self.users.get_by_id(user_id).await? {
            Some(mut user) => {
                user.phone_verified = true;
                self.users.update(user_id, &user).await?;
                info!(user_id, "Phone number verified");
            }
            None => warn!(user_id, "OTP verified for unknown user"),
        }
        Ok(())
    }
}

#[async_trait]
impl OtpService for OtpServiceImpl {
    async fn send(&self, user_id: &str, phone_number: &str) -> Result<OtpSent> {
        let user_id = RequestValidator::required("user_id", Some(user_id))?;
        let phone_number = RequestValidator::required("phone_number", Some(phone_number))?;
        RequestValidator::validate_phone("phone_number", phone_number)?;

        let now = self.clock.now();
        let client = RateLimitClient::Phone(phone_number.to_string());
        if let RateLimitResult::Limited { retry_after } =
            self.rate_limiter.check_rate_limit(&client, now).await
        {
            warn!(retry_after, "OTP rate limit reached");
            return Err(AppError::RateLimited);
        }

        let code = Otp::generate_code(self.config.code_length, &mut rand::rng());
        let mut otp = Otp::new(
            user_id,
            code,
            phone_number,
            Duration::minutes(self.config.ttl_minutes),
            now,
        );

        let sent = self.sms.send(phone_number, &self.message_for(&otp.code)).await?;
        otp.provider_sid = Some(sent.sid);
        let otp = self.otps.create(&otp).await?;
        info!(user_id, otp_id = %otp.id, "OTP sent");

        Ok(OtpSent {
            success: true,
            expires_in: otp.seconds_remaining(now),
            otp_id: otp.id,
            message: OTP_SENT.to_string(),
        })
    }

    async fn verify(&self, user_id: &str, code: &str) -> Result<OtpVerification> {
        let user_id = RequestValidator::required("user_id", Some(user_id))?;
        let code = RequestValidator::required("code", Some(code))?;

        let client = RateLimitClient::User(user_id.to_string());
        if let RateLimitResult::Limited { retry_after } = self
            .attempt_limiter
            .check_rate_limit(&client, self.clock.now())
            .await
        {
            warn!(user_id, retry_after, "OTP verification attempts exhausted");
            return Err(AppError::RateLimited);
        }

        let candidate = self
            .otps
            .find_by_field("user_id", &json!(user_id))
            .await?
            .into_iter()
            .filter(|otp| !otp.verified && otp.code == code)
            .max_by_key(|otp| otp.created_at);

        let Some(mut otp) = candidate else {
            return Ok(OtpVerification::rejected(OTP_INVALID));
        };

        let now = self.clock.now();
        if otp.is_expired(now) {
            return Ok(OtpVerification::rejected(OTP_EXPIRED));
        }

        otp.mark_verified(now);
        self.otps.update(&otp.id, &otp).await?;
        self.mark_phone_verified(user_id).await?;

        Ok(OtpVerification {
            valid: true,
            message: OTP_VERIFIED.to_string(),
        })
    }
}

pub fn create_otp_service(
    otps: Arc<dyn Repository<Otp>>,
    users: Arc<dyn Repository<User>>,
    sms: Arc<dyn SmsSender>,
    rate_limiter: RateLimiter,
    config: OtpConfig,
    clock: Arc<dyn Clock>,
) -> Arc<dyn OtpService> {
    Arc::new(OtpServiceImpl::new(
        otps,
        users,
        sms,
        rate_limiter,
        config,
        clock,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::config::AppConfig;
    use crate::sms::{DisabledSms, MockSmsSender, SentMessage};
    use crate::storage::memory::MemoryRepository;
    use chrono::{DateTime, TimeZone, Utc};

    const PHONE: &str = "+22670123456";

    struct Fixture {
        otps: Arc<MemoryRepository<Otp>>,
        users: Arc<MemoryRepository<User>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                otps: Arc::new(MemoryRepository::new()),
                users: Arc::new(MemoryRepository::new()),
            }
        }

        fn service(
            &self,
            sms: Arc<dyn SmsSender>,
            limiter: RateLimiter,
            now: DateTime<Utc>,
        ) -> OtpServiceImpl {
            OtpServiceImpl::new(
                self.otps.clone(),
                self.users.clone(),
                sms,
                limiter,
                AppConfig::development().otp,
                Arc::new(FixedClock::new(now)),
            )
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn accepting_sender() -> MockSmsSender {
        let mut mock = MockSmsSender::new();
        mock.expect_send()
            .withf(|to, body| {
                to == PHONE
                    && body.starts_with("Votre code OTP est : ")
                    && body.ends_with("\nValide pendant 10 minutes.")
            })
            .returning(|_, _| {
                Ok(SentMessage {
                    sid: "SM100".into(),
                    status: Some("queued".into()),
                })
            });
        mock
    }

    async fn stored_code(fixture: &Fixture, user_id: &str) -> String {
        fixture
            .otps
            .find_by_field("user_id", &json!(user_id))
            .await
            .unwrap()
            .remove(0)
            .code
    }

    #[tokio::test]
    async fn test_send_then_verify() {
        let fixture = Fixture::new();
        let user = User::new("Awa", "Sawadogo", "awa", "BF", Some(PHONE.into()), "x".into(), start());
        fixture.users.create(&user).await.unwrap();

        let service = fixture.service(Arc::new(accepting_sender()), RateLimiter::disabled(), start());
        let sent = service.send(&user.id, PHONE).await.unwrap();
        assert!(sent.success);
        assert_eq!(sent.expires_in, 600);

        let code = stored_code(&fixture, &user.id).await;
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let wrong = service.verify(&user.id, "abcdef").await.unwrap();
        assert_eq!(wrong, OtpVerification::rejected(OTP_INVALID));

        let ok = service.verify(&user.id, &code).await.unwrap();
        assert!(ok.valid);
        assert_eq!(ok.message, OTP_VERIFIED);
        assert!(fixture.users.get_by_id(&user.id).await.unwrap().unwrap().phone_verified);

        let again = service.verify(&user.id, &code).await.unwrap();
        assert_eq!(again.message, OTP_INVALID);
    }

    #[tokio::test]
    async fn test_expired_code() {
        let fixture = Fixture::new();
        let sender: Arc<dyn SmsSender> = Arc::new(accepting_sender());
        fixture
            .service(sender.clone(), RateLimiter::disabled(), start())
            .send("u1", PHONE)
            .await
            .unwrap();
        let code = stored_code(&fixture, "u1").await;

        let later = fixture.service(sender, RateLimiter::disabled(), start() + Duration::minutes(11));
        let result = later.verify("u1", &code).await.unwrap();
        assert_eq!(result, OtpVerification::rejected(OTP_EXPIRED));
    }

    #[tokio::test]
    async fn test_verify_attempts_limited_per_user() {
        let fixture = Fixture::new();
        let service = fixture.service(Arc::new(accepting_sender()), RateLimiter::disabled(), start());
        service.send("u1", PHONE).await.unwrap();
        let code = stored_code(&fixture, "u1").await;

        for _ in 0..AppConfig::development().otp.max_attempts {
            let result = service.verify("u1", "000000x").await.unwrap();
            assert_eq!(result.message, OTP_INVALID);
        }
        assert!(matches!(
            service.verify("u1", &code).await,
            Err(AppError::RateLimited)
        ));
        assert_eq!(
            service.verify("u2", "123456").await.unwrap().message,
            OTP_INVALID
        );
    }

    #[tokio::test]
    async fn test_invalid_phone_and_missing_data() {
        let fixture = Fixture::new();
        let service = fixture.service(Arc::new(MockSmsSender::new()), RateLimiter::disabled(), start());
        assert!(matches!(
            service.send("u1", "70123456").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.send("", PHONE).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_per_phone() {
        let fixture = Fixture::new();
        let service = fixture.service(Arc::new(accepting_sender()), RateLimiter::per_hour(2), start());
        service.send("u1", PHONE).await.unwrap();
        service.send("u1", PHONE).await.unwrap();
        assert!(matches!(
            service.send("u1", PHONE).await,
            Err(AppError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_sms_not_configured() {
        let fixture = Fixture::new();
        let service = fixture.service(Arc::new(DisabledSms), RateLimiter::disabled(), start());
        assert!(matches!(
            service.send("u1", PHONE).await,
            Err(AppError::SmsUnavailable)
        ));
        assert!(
            fixture
                .otps
                .find_by_field("user_id", &json!("u1"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
