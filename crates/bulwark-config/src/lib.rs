//! Typed configuration for Bulwark security pipelines.
//!
//! Configuration is layered: built-in defaults, then a TOML or JSON file,
//! then `PREFIX__SECTION__KEY` environment variables. Unknown fields are
//! rejected.
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [matching]
//! always_use_full_path = true
//! url_decode = true
//! remove_semicolon_content = true
//! case_sensitive = true
//!
//! [authorization]
//! enabled = true
//!
//! [[authorization.rules]]
//! pattern = "/orders/{id}"
//! method = "DELETE"
//! access = 'input.variables.id == "42"'
//! bind_variables = true
//! ```
//!
//! # Example
//!
//! ```no_run
//! use bulwark_config::ConfigLoader;
//!
//! # fn main() -> Result<(), bulwark_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("bulwark.toml")?
//!     .with_env_prefix("BULWARK")
//!     .load()?;
//!
//! let helper = config.matching.path_helper();
//! # let _ = helper;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::BulwarkConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AuthorizationConfig, LogFormat, LoggingConfig, MatchingConfig, RuleConfig};
