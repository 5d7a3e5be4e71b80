//! Configuration section types.

use bulwark_core::UrlPathHelper;
use bulwark_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or env-filter directive (e.g. `info`, `bulwark_pipeline=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the settings used by
    /// [`bulwark_telemetry::init_logging`].
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi_enabled: self.ansi_enabled,
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Request matching configuration.
///
/// Controls how the lookup path is derived from a request and whether
/// path patterns compare case-sensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Match against the full path within the application.
    #[serde(default = "default_true")]
    pub always_use_full_path: bool,

    /// Percent-decode request paths before matching.
    #[serde(default = "default_true")]
    pub url_decode: bool,

    /// Strip `;name=value` path parameters before matching.
    #[serde(default = "default_true")]
    pub remove_semicolon_content: bool,

    /// Compare path patterns case-sensitively.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            always_use_full_path: true,
            url_decode: true,
            remove_semicolon_content: true,
            case_sensitive: true,
        }
    }
}

impl MatchingConfig {
    /// Returns the lookup-path helper described by this section.
    ///
    /// ```
    /// use bulwark_config::MatchingConfig;
    ///
    /// let helper = MatchingConfig::default().path_helper();
    /// assert!(helper.always_use_full_path);
    /// ```
    #[must_use]
    pub fn path_helper(&self) -> UrlPathHelper {
        UrlPathHelper {
            always_use_full_path: self.always_use_full_path,
            url_decode: self.url_decode,
            remove_semicolon_content: self.remove_semicolon_content,
        }
    }
}

/// Authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Enable the access-decision stage.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Access rules, evaluated in order. The first matching rule decides.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

/// A single access rule.
///
/// ```toml
/// [[authorization.rules]]
/// pattern = "/orders/{id}"
/// method = "DELETE"
/// access = 'input.request.attributes.role == "admin"'
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Path pattern the rule protects.
    pub pattern: String,

    /// Restrict the rule to one HTTP method.
    #[serde(default)]
    pub method: Option<String>,

    /// Restrict the rule to one servlet path.
    #[serde(default)]
    pub servlet_path: Option<String>,

    /// Predicate expression that must hold for access to be granted.
    pub access: String,

    /// Expose the pattern's path variables to the predicate as `variables`.
    #[serde(default)]
    pub bind_variables: bool,
}

impl RuleConfig {
    /// Creates a rule with no method or servlet path constraint.
    pub fn new(pattern: impl Into<String>, access: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            method: None,
            servlet_path: None,
            access: access.into(),
            bind_variables: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_config_conversion() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ansi_enabled: true,
            ..LoggingConfig::default()
        };
        let log = config.log_config();
        assert_eq!(log.level, "debug");
        assert!(!log.json_format);
        assert!(log.ansi_enabled);
    }

    #[test]
    fn test_matching_path_helper() {
        let config = MatchingConfig {
            url_decode: false,
            ..MatchingConfig::default()
        };
        let helper = config.path_helper();
        assert!(helper.always_use_full_path);
        assert!(!helper.url_decode);
        assert!(helper.remove_semicolon_content);
    }

    #[test]
    fn test_rule_defaults_from_toml() {
        let rule: RuleConfig = toml::from_str(
            r#"
            pattern = "/orders/**"
            access = "true"
            "#,
        )
        .unwrap();
        assert_eq!(rule, RuleConfig::new("/orders/**", "true"));
    }

    #[test]
    fn test_rule_rejects_unknown_fields() {
        let result: Result<RuleConfig, _> = toml::from_str(
            r#"
            pattern = "/orders"
            access = "true"
            roles = ["admin"]
            "#,
        );
        assert!(result.is_err());
    }
}
