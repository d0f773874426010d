//! Configuration validation.
//!
//! Collects every problem in one pass so a bad deployment fails at startup
//! with the full list instead of one error at a time.

use crate::{AppConfig, DatabaseConfig};
use fleetdb_core::LoggingConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { min, max } => write!(
                f,
                "Invalid pool size: min ({min}) cannot be greater than max ({max})"
            ),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {value} exceeds maximum allowed ({maximum})")
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {url_type} URL: {message}")
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{name}' must be positive, got {value}")
            }
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: off, trace, debug, info, warn, error)"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] =
        &["off", "trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_database(&config.database, &mut errors);
        Self::validate_logging(&config.logging, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_database(config: &DatabaseConfig, errors: &mut Vec<ConfigValidationError>) {
        match Url::parse(&config.url) {
            Ok(url) if matches!(url.scheme(), "postgres" | "postgresql") => {}
            Ok(url) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: format!(
                    "scheme '{}' is not supported, use postgres:// or postgresql://",
                    url.scheme()
                ),
            }),
            Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: e.to_string(),
            }),
        }

        if config.min_connections > config.max_connections {
            errors.push(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
        if config.idle_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "database.idle_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    /// Accepts a plain level (`info`) or a directive list (`info,fleetdb=debug`).
    fn validate_logging(config: &LoggingConfig, errors: &mut Vec<ConfigValidationError>) {
        let valid = !config.level.trim().is_empty()
            && config.level.split(',').all(|directive| {
                let level = directive.rsplit('=').next().unwrap_or_default();
                Self::VALID_LOG_LEVELS.contains(&level.trim().to_lowercase().as_str())
            });
        if !valid {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.level.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut config = AppConfig::default();
        config.database.min_connections = 30;
        config.database.max_connections = 10;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigValidationError::InvalidPoolSize { min: 30, max: 10 }));
    }

    #[test]
    fn test_pool_size_too_large() {
        let mut config = AppConfig::default();
        config.database.max_connections = 5000;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::PoolSizeTooLarge { value: 5000, .. })));
    }

    #[test]
    fn test_non_postgres_url_rejected() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://root@localhost/fleet".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(
            &errors[0],
            ConfigValidationError::InvalidUrl { url_type, .. } if url_type == "database"
        ));

        config.database.url = "not a url".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.database.connect_timeout_secs = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::NonPositiveTimeout { name, .. } if name == "database.connect_timeout_secs"
        )));
    }

    #[test]
    fn test_log_level_directives() {
        let mut config = AppConfig::default();
        config.logging.level = "warn,fleetdb_repository=trace".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.logging.level = "loud".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(&errors[0], ConfigValidationError::InvalidLogLevel { value } if value == "loud"));
    }

    #[test]
    fn test_multiple_errors() {
        let mut config = AppConfig::default();
        config.database.min_connections = 100;
        config.database.max_connections = 10;
        config.database.idle_timeout_secs = 0;
        config.logging.level = String::new();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_validation_errors() {
        let errors = vec![
            ConfigValidationError::InvalidPoolSize { min: 5, max: 1 },
            ConfigValidationError::InvalidLogLevel {
                value: "loud".to_string(),
            },
        ];

        let output = format_validation_errors(&errors);
        assert!(output.contains("1. Invalid pool size"));
        assert!(output.contains("2. Invalid log level"));
    }
}
