//! OTP DTOs

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendOtpRequest {
    pub phone_number: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOtpRequest {
    pub user_id: Option<String>,
    pub code: Option<String>,
}
