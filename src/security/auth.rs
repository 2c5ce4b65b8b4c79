//! Authentication
//!
//! HS256 bearer tokens with issuer, audience and expiry checks, and an
//! in-process revocation list keyed by token id.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::config::SecurityConfig;
use crate::error::{AppError, Result};
use crate::models::Role;

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// `admin` or `user`
    pub role: String,
    pub exp: usize,
    pub nbf: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    pub fn new(
        sub: &str,
        role: Role,
        expiry_seconds: u64,
        issuer: &str,
        audience: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let iat = now.timestamp().max(0) as usize;
        Self {
            sub: sub.to_string(),
            role: role.as_str().to_string(),
            exp: iat + expiry_seconds as usize,
            nbf: iat,
            iat,
            iss: issuer.to_string(),
            aud: audience.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Token handed to a client after login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT issuer and validator
#[derive(Clone)]
pub struct JwtAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiry_seconds: u64,
    /// jti -> expiry timestamp
    revoked: Arc<DashMap<String, usize>>,
    /// Time source for `exp` and `nbf` checks
    clock: Arc<dyn Clock>,
}

impl JwtAuth {
    pub fn new(secret: &str, issuer: &str, audience: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiry_seconds,
            revoked: Arc::new(DashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Check expiry against `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            &config.jwt_audience,
            config.jwt_expiry_seconds,
        )
    }

    /// Create a development JWT authenticator
    pub fn development() -> Self {
        Self::new(
            "dev-secret-change-in-production-min-32-chars",
            "maternia",
            "maternia-api",
            3600,
        )
    }

    /// Sign a token for a user.
    pub fn issue(&self, user_id: &str, role: Role, now: DateTime<Utc>) -> Result<AuthToken> {
        let claims = Claims::new(
            user_id,
            role,
            self.expiry_seconds,
            &self.issuer,
            &self.audience,
            now,
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(AuthToken {
            token,
            token_type: "Bearer".to_string(),
            expires_at: now + Duration::seconds(self.expiry_seconds as i64),
        })
    }

    /// Decode and check signature, issuer, audience, expiry and revocation.
    ///
    /// `exp` and `nbf` are compared with the authenticator's clock, the same
    /// source the issuing services read.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.clone()]);
        validation.set_audience(&[self.audience.clone()]);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;

        let now = self.clock.now().timestamp().max(0) as usize;
        if claims.exp <= now {
            return Err(AppError::Authentication("Token has expired".to_string()));
        }
        if claims.nbf > now {
            return Err(AppError::Authentication("Token is not valid yet".to_string()));
        }

        if self.revoked.contains_key(&claims.jti) {
            return Err(AppError::Authentication("Token has been revoked".to_string()));
        }

        Ok(claims)
    }

    /// Reject the token from now until it expires.
    pub fn revoke(&self, claims: &Claims, now: DateTime<Utc>) {
        self.purge_revoked(now);
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    /// Drop revocations of tokens that have expired anyway.
    pub fn purge_revoked(&self, now: DateTime<Utc>) {
        let now = now.timestamp().max(0) as usize;
        self.revoked.retain(|_, exp| *exp >= now);
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("ApiKey abc")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_issue_and_validate() {
        let auth = JwtAuth::development();
        let token = auth.issue("user-1", Role::Admin, Utc::now()).unwrap();
        let claims = auth.validate_token(&token.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.is_admin());
        assert_eq!(claims.iss, "maternia");
    }

    #[test]
    fn test_rejects_other_secret_and_audience() {
        let token = JwtAuth::development()
            .issue("user-1", Role::User, Utc::now())
            .unwrap();

        let other_secret = JwtAuth::new("another-secret", "maternia", "maternia-api", 3600);
        assert!(other_secret.validate_token(&token.token).is_err());

        let other_audience = JwtAuth::new(
            "dev-secret-change-in-production-min-32-chars",
            "maternia",
            "someone-else",
            3600,
        );
        assert!(other_audience.validate_token(&token.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = JwtAuth::development();
        let token = auth
            .issue("user-1", Role::User, Utc::now() - Duration::hours(3))
            .unwrap();
        assert!(matches!(
            auth.validate_token(&token.token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_expiry_follows_injected_clock() {
        let issued_at = Utc.with_ymd_and_hms(2024, 10, 19, 0, 0, 0).unwrap();
        let auth = JwtAuth::development().with_clock(Arc::new(FixedClock::new(issued_at)));
        let token = auth.issue("user-1", Role::User, issued_at).unwrap();
        assert_eq!(auth.validate_token(&token.token).unwrap().sub, "user-1");

        let later = auth
            .clone()
            .with_clock(Arc::new(FixedClock::new(issued_at + Duration::hours(2))));
        assert!(matches!(
            later.validate_token(&token.token),
            Err(AppError::Authentication(ref m)) if m.contains("expired")
        ));

        let earlier = auth.with_clock(Arc::new(FixedClock::new(issued_at - Duration::minutes(5))));
        assert!(earlier.validate_token(&token.token).is_err());
    }

    #[test]
    fn test_revocation() {
        let auth = JwtAuth::development();
        let now = Utc::now();
        let token = auth.issue("user-1", Role::User, now).unwrap();
        let claims = auth.validate_token(&token.token).unwrap();

        auth.revoke(&claims, now);
        assert!(auth.validate_token(&token.token).is_err());

        auth.purge_revoked(now + Duration::hours(2));
        assert_eq!(auth.revoked_count(), 0);
    }
}
