//! Account service
//!
//! Registration, login and logout over the user repository. Passwords are
//! stored as argon2 hashes; sessions are stateless bearer tokens.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::auth::{AuthToken, Claims, JwtAuth};
use crate::security::password::{hash_password, verify_password};
use crate::security::validation::RequestValidator;
use crate::storage::repository::Repository;

/// Message shown for any failed login.
pub const INVALID_CREDENTIALS: &str = "Nom d'utilisateur ou mot de passe incorrect.";

pub const PASSWORD_MISMATCH: &str = "Les mots de passe ne correspondent pas.";

pub const USERNAME_TAKEN: &str = "Nom d'utilisateur déjà pris.";

const MAX_NAME_LENGTH: usize = 50;
const MAX_USERNAME_LENGTH: usize = 20;

/// Registration form
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub country: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Issued token and the account it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub token: AuthToken,
    pub user: UserProfile,
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub country: String,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub is_admin: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            country: user.country.clone(),
            phone_number: user.phone_number.clone(),
            phone_verified: user.phone_verified,
            is_admin: user.is_admin,
        }
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and sign it in.
    async fn register(&self, registration: Registration) -> Result<AuthSession>;

    async fn login(&self, username: &str, password: &str) -> Result<AuthSession>;

    /// Revoke the presented token.
    async fn logout(&self, claims: &Claims) -> Result<()>;

    async fn current_user(&self, user_id: &str) -> Result<UserProfile>;
}

pub struct AuthServiceImpl {
    users: Arc<dyn Repository<User>>,
    jwt: JwtAuth,
    clock: Arc<dyn Clock>,
    /// Serializes the username check with the insert
    registration_lock: Mutex<()>,
}

impl AuthServiceImpl {
    pub fn new(users: Arc<dyn Repository<User>>, jwt: JwtAuth, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            jwt,
            clock,
            registration_lock: Mutex::new(()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut users = self
            .users
            .find_by_field("username", &json!(username))
            .await?;
        Ok(users.pop())
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        let token = self.jwt.issue(&user.id, user.role(), self.clock.now())?;
        Ok(AuthSession {
            token,
            user: UserProfile::from(user),
        })
    }
}

/// argon2 is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let first_name = RequestValidator::required("first_name", Some(registration.first_name.as_str()))?;
        let last_name = RequestValidator::required("last_name", Some(registration.last_name.as_str()))?;
        let username = RequestValidator::required("username", Some(registration.username.as_str()))?;
        let country = RequestValidator::required("country", Some(registration.country.as_str()))?;
        RequestValidator::required("password", Some(registration.password.as_str()))?;

        RequestValidator::validate_length("first_name", first_name, None, Some(MAX_NAME_LENGTH))?;
        RequestValidator::validate_length("last_name", last_name, None, Some(MAX_NAME_LENGTH))?;
        RequestValidator::validate_length("username", username, None, Some(MAX_USERNAME_LENGTH))?;
        RequestValidator::validate_length("country", country, None, Some(MAX_NAME_LENGTH))?;

        let phone_number = registration
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty());
        if let Some(phone) = phone_number {
            RequestValidator::validate_phone("phone_number", phone)?;
        }

        if registration.password != registration.confirm_password {
            return Err(AppError::Validation(PASSWORD_MISMATCH.to_string()));
        }

        let password_hash = hash_blocking(registration.password).await?;

        let _guard = self.registration_lock.lock().await;
        if self.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let user = User::new(
            first_name,
            last_name,
            username,
            country,
            phone_number.map(str::to_string),
            password_hash,
            self.clock.now(),
        );
        let user = self.users.create(&user).await?;
        info!(user_id = %user.id, "User registered");

        self.session_for(&user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
        let invalid = || AppError::Authentication(INVALID_CREDENTIALS.to_string());

        let user = self.find_by_username(username.trim()).await?.ok_or_else(invalid)?;
        if !verify_blocking(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login rejected");
            return Err(invalid());
        }

        self.session_for(&user)
    }

    async fn logout(&self, claims: &Claims) -> Result<()> {
        self.jwt.revoke(claims, self.clock.now());
        info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    async fn current_user(&self, user_id: &str) -> Result<UserProfile> {
        self.users
            .get_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }
}

pub fn create_auth_service(
    users: Arc<dyn Repository<User>>,
    jwt: JwtAuth,
    clock: Arc<dyn Clock>,
) -> Arc<dyn AuthService> {
    Arc::new(AuthServiceImpl::new(users, jwt, clock))
}
