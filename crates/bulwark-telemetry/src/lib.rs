//! Observability for Bulwark.
//!
//! - **Logging**: structured `tracing` output, JSON or pretty, filtered by an
//!   env-filter directive
//! - **Metrics**: counters through the `metrics` facade, rendered in
//!   Prometheus text format
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bulwark_matcher_fallback_total` | Counter | `reason` | Routed matcher fell back to plain pattern matching |
//! | `bulwark_access_decisions_total` | Counter | `result` | Access decisions by outcome |
//!
//! # Example
//!
//! ```rust,ignore
//! use bulwark_telemetry::{init_logging, init_metrics, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! init_metrics()?;
//! ```
//!
//! Recording helpers are safe to call before any recorder is installed;
//! the `metrics` facade discards the samples.

#![doc(html_root_url = "https://docs.rs/bulwark-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
