//! Account DTOs

use serde::{Deserialize, Serialize};

use crate::services::Registration;

/// Registration request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub country: Option<String>,
    /// Accepted as `phone` too
    #[serde(alias = "phone")]
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Self {
            first_name: request.first_name.unwrap_or_default(),
            last_name: request.last_name.unwrap_or_default(),
            username: request.username.unwrap_or_default(),
            country: request.country.unwrap_or_default(),
            phone_number: request.phone_number,
            password: request.password.unwrap_or_default(),
            confirm_password: request.confirm_password.unwrap_or_default(),
        }
    }
}

/// Login request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}
