//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`BulwarkConfig`](crate::BulwarkConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file passed to `with_file` does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// Unreadable path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or TOML that does not fit the schema.
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed JSON, or JSON that does not fit the schema.
    #[error("invalid JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field holds a value the pipeline cannot use.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field path, e.g. `authorization.rules[0].method`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be parsed.
    #[error("environment override {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// The loader could not proceed: an unknown format or a malformed `.env` file.
    #[error("config loader: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Missing file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Unreadable file.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Unusable field value.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Unparseable override variable.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Loader failure.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let err = ConfigError::file_not_found("/path/to/bulwark.toml");
        assert!(err.to_string().contains("/path/to/bulwark.toml"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("authorization.rules[0].pattern", "must start with '/'");
        let message = err.to_string();
        assert!(message.contains("authorization.rules[0].pattern"));
        assert!(message.contains("must start with '/'"));
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigError::env_parse_error("BULWARK__LOGGING__ENABLED", "expected boolean");
        assert!(err.to_string().contains("BULWARK__LOGGING__ENABLED"));
    }
}
