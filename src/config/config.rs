use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `memory` for the in-process backend, otherwise a SurrealDB endpoint
    /// such as `rocksdb://./data/maternia.db` or `http://localhost:8000`
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root user; sign-in is skipped when empty
    pub username: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request timeout (seconds)
    pub request_timeout: u64,
    /// Maximum request body size (bytes)
    pub max_request_size: usize,
}

/// Token and abuse-protection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Token lifetime (seconds)
    pub jwt_expiry_seconds: u64,
    /// OTP sends allowed per phone number per hour
    pub otp_requests_per_hour: u32,
    /// Empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON log lines
    pub structured: bool,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,
}

/// Intent matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChatbotConfig {
    pub corpus_path: PathBuf,
    /// Best similarity must be strictly greater than this to match
    pub similarity_threshold: f64,
}

/// SMS provider credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Sender phone number
    pub from_number: Option<String>,
    pub api_base_url: String,
    /// Provider request timeout (seconds)
    pub timeout_seconds: u64,
}

impl SmsConfig {
    /// Credentials present and non-empty.
    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.account_sid) && present(&self.auth_token)
    }
}

/// One-time password settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OtpConfig {
    pub code_length: usize,
    pub ttl_minutes: i64,
    /// Verification attempts per user within one code lifetime; 0 disables the limit
    pub max_attempts: u32,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub chatbot: ChatbotConfig,
    pub sms: SmsConfig,
    pub otp: OtpConfig,
    pub app_name: String,
    pub environment: String,
}

impl AppConfig {
    /// Development defaults
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                url: "memory".into(),
                namespace: "maternia".into(),
                database: "chatbot".into(),
                username: String::new(),
                password: String::new(),
            },
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout: 30,
                max_request_size: 1024 * 1024,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-in-production".into(),
                jwt_issuer: "maternia".into(),
                jwt_audience: "maternia-api".into(),
                jwt_expiry_seconds: 7 * 24 * 3600,
                otp_requests_per_hour: 5,
                cors_allowed_origins: Vec::new(),
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            chatbot: ChatbotConfig {
                corpus_path: PathBuf::from("./data/corpus.json"),
                similarity_threshold: 0.20,
            },
            sms: SmsConfig {
                account_sid: None,
                auth_token: None,
                from_number: None,
                api_base_url: "https://api.twilio.com".into(),
                timeout_seconds: 10,
            },
            otp: OtpConfig {
                code_length: 6,
                ttl_minutes: 10,
                max_attempts: 5,
            },
            app_name: "maternia".into(),
            environment: "development".into(),
        }
    }

    /// Production defaults
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.database.url = "rocksdb://./data/maternia.db".into();
        config
    }
}
