use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

/// One-time password sent for phone verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Otp {
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub phone_number: String,
    pub verified: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub provider_sid: Option<String>,
}

impl Otp {
    pub fn new(user_id: &str, code: String, phone_number: &str, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            code,
            phone_number: phone_number.to_string(),
            verified: false,
            expires_at: now + ttl,
            created_at: now,
            verified_at: None,
            provider_sid: None,
        }
    }

    /// Random numeric code of `length` digits.
    pub fn generate_code<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
        (0..length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whole seconds until expiry, zero once expired.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.verified = true;
        self.verified_at = Some(now);
    }
}

impl Entity for Otp {
    const TABLE: &'static str = "otp";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
