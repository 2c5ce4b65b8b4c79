//! Security Module
//!
//! - Authentication (JWT bearer tokens with revocation)
//! - Password hashing (argon2)
//! - Rate Limiting
//! - Request Validation
//! - Security Middleware

pub mod auth;
pub mod middleware;
pub mod password;
pub mod rate_limit;
pub mod validation;

pub use auth::{AuthToken, Claims, JwtAuth};
pub use rate_limit::{RateLimitClient, RateLimitResult, RateLimiter};
pub use validation::{RequestValidator, ValidationError};
