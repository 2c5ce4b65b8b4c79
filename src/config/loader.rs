use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Environment prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "MATERNIA_";

/// Keys read verbatim from the environment, later variables winning.
///
/// `Env` parses values, so `+22670000000` would arrive as an integer and a
/// numeric secret would lose its type; these keys are merged as strings.
const STRING_ENV_KEYS: &[(&str, &[&str])] = &[
    ("sms.account_sid", &["MATERNIA_SMS__ACCOUNT_SID", "TWILIO_ACCOUNT_SID"]),
    ("sms.auth_token", &["MATERNIA_SMS__AUTH_TOKEN", "TWILIO_AUTH_TOKEN"]),
    ("sms.from_number", &["MATERNIA_SMS__FROM_NUMBER", "TWILIO_PHONE_NUMBER"]),
    ("security.jwt_secret", &["MATERNIA_SECURITY__JWT_SECRET", "SECRET_KEY"]),
    ("database.username", &["MATERNIA_DATABASE__USERNAME"]),
    ("database.password", &["MATERNIA_DATABASE__PASSWORD"]),
];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the default path.
    ///
    /// Sources, later ones win:
    /// 1. development defaults
    /// 2. ./config.toml
    /// 3. `MATERNIA_*` environment variables
    /// 4. `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`, `SECRET_KEY`
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    pub fn figment(path: impl AsRef<Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        for (key, variables) in STRING_ENV_KEYS {
            for variable in *variables {
                if let Ok(value) = std::env::var(variable) {
                    figment = figment.merge(Serialized::default(key, value));
                }
            }
        }
        figment
    }

    /// Validate a loaded configuration
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.security.jwt_secret.is_empty() {
            return Err(ConfigValidationError::MissingJwtSecret);
        }

        let threshold = config.chatbot.similarity_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(ConfigValidationError::InvalidThreshold(threshold));
        }

        if config.otp.code_length == 0 || config.otp.ttl_minutes <= 0 {
            return Err(ConfigValidationError::InvalidOtp);
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("Server port must be greater than 0")]
    InvalidPort,

    #[error("Database URL is not configured")]
    MissingDatabaseUrl,

    #[error("JWT secret is not configured")]
    MissingJwtSecret,

    #[error("Similarity threshold {0} is outside [0, 1)")]
    InvalidThreshold(f64),

    #[error("OTP code length and lifetime must be positive")]
    InvalidOtp,
}

/// Default configuration file path
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// Whether the default configuration file exists
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load()?;
            assert_eq!(config.server.port, 8080);
            assert!(config.database.is_memory());
            assert_eq!(config.chatbot.similarity_threshold, 0.20);
            assert!(!config.sms.is_configured());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                environment = "staging"

                [server]
                port = 9000

                [chatbot]
                similarity_threshold = 0.35
                "#,
            )?;
            jail.set_env("MATERNIA_SERVER__PORT", "9100");
            jail.set_env("MATERNIA_SMS__FROM_NUMBER", "+22600000000");

            let config = ConfigLoader::load()?;
            assert_eq!(config.environment, "staging");
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.chatbot.similarity_threshold, 0.35);
            assert_eq!(config.sms.from_number.as_deref(), Some("+22600000000"));
            assert_eq!(config.server.host, "0.0.0.0");
            Ok(())
        });
    }

    #[test]
    fn test_legacy_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("TWILIO_ACCOUNT_SID", "AC123");
            jail.set_env("TWILIO_AUTH_TOKEN", "token");
            jail.set_env("SECRET_KEY", "s3cret");

            let config = ConfigLoader::load()?;
            assert!(config.sms.is_configured());
            assert_eq!(config.sms.account_sid.as_deref(), Some("AC123"));
            assert_eq!(config.security.jwt_secret, "s3cret");
            Ok(())
        });
    }

    #[test]
    fn test_numeric_looking_values_stay_strings() {
        Jail::expect_with(|jail| {
            jail.set_env("TWILIO_PHONE_NUMBER", "+22670000000");
            jail.set_env("TWILIO_AUTH_TOKEN", "0123456789");
            jail.set_env("MATERNIA_SECURITY__JWT_SECRET", "424242");

            let config = ConfigLoader::load()?;
            assert_eq!(config.sms.from_number.as_deref(), Some("+22670000000"));
            assert_eq!(config.sms.auth_token.as_deref(), Some("0123456789"));
            assert_eq!(config.security.jwt_secret, "424242");
            Ok(())
        });
    }

    #[test]
    fn test_legacy_variable_wins_over_prefixed() {
        Jail::expect_with(|jail| {
            jail.set_env("MATERNIA_SMS__FROM_NUMBER", "+22600000000");
            jail.set_env("TWILIO_PHONE_NUMBER", "+22670000000");

            let config = ConfigLoader::load()?;
            assert_eq!(config.sms.from_number.as_deref(), Some("+22670000000"));
            Ok(())
        });
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::development();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.chatbot.similarity_threshold = 1.0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidThreshold(_))
        ));

        config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));

        config = AppConfig::development();
        config.security.jwt_secret.clear();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingJwtSecret)
        ));
    }
}
