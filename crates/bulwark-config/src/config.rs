//! Top-level configuration type.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::{AuthorizationConfig, ConfigError, LogFormat, LoggingConfig, MatchingConfig};

/// Complete Bulwark configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use bulwark_config::BulwarkConfig;
///
/// let config = BulwarkConfig::default();
/// assert!(config.matching.always_use_full_path);
/// assert!(config.authorization.rules.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BulwarkConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Request matching configuration.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Authorization rules.
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

impl BulwarkConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a valid filter directive
    /// - A rule pattern does not start with `/`
    /// - A rule method is not a valid HTTP method token
    /// - A rule access expression is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if bulwark_telemetry::logging::create_env_filter(&self.logging.level).is_err() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("invalid filter directive: {}", self.logging.level),
            ));
        }

        for (index, rule) in self.authorization.rules.iter().enumerate() {
            let field = |name: &str| format!("authorization.rules[{index}].{name}");

            if !rule.pattern.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    field("pattern"),
                    format!("must start with '/': {}", rule.pattern),
                ));
            }

            if let Some(method) = &rule.method {
                if Method::from_bytes(method.as_bytes()).is_err() {
                    return Err(ConfigError::invalid_value(
                        field("method"),
                        format!("invalid HTTP method: {method}"),
                    ));
                }
            }

            if rule.access.trim().is_empty() {
                return Err(ConfigError::invalid_value(field("access"), "must not be empty"));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored logs at debug level.
    ///
    /// ```
    /// use bulwark_config::{BulwarkConfig, LogFormat};
    ///
    /// let config = BulwarkConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }
}
