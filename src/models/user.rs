use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::repository::Entity;

/// Role carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique login name
    pub username: String,
    pub country: String,
    /// E.164 number used for SMS
    pub phone_number: Option<String>,
    /// Argon2 PHC string
    pub password_hash: String,
    pub phone_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: &str,
        last_name: &str,
        username: &str,
        country: &str,
        phone_number: Option<String>,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: username.to_string(),
            country: country.to_string(),
            phone_number,
            password_hash,
            phone_verified: false,
            is_admin: false,
            created_at: now,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_admin { Role::Admin } else { Role::User }
    }
}

impl Entity for User {
    const TABLE: &'static str = "user";
    const OWNER_FIELD: &'static str = "id";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.id
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}
