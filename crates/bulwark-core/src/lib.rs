//! # Bulwark Core
//!
//! Core types and traits for the Bulwark security filter chain.
//!
//! This crate provides the foundational types used throughout Bulwark:
//!
//! - [`Stage`] / [`StageKind`] - A unit of request processing and the canonical stage order
//! - [`Invocation`] / [`Chain`] - Per-request context handed to each stage (live or synthetic)
//! - [`RequestParts`] - The request surface read by matchers
//! - [`LiveRequest`] / [`SyntheticRequest`] - Real and in-memory request representations
//! - [`UrlPathHelper`] - Lookup-path normalization
//! - [`BulwarkError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/bulwark-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod invocation;
mod request;
mod stage;
pub mod types;
pub mod url;

pub use error::{BulwarkError, BulwarkResult};
pub use invocation::{Chain, Invocation, Terminal};
pub use request::{
    default_port, LiveRequest, RequestParts, SyntheticRequest, DEFAULT_CONTEXT_PATH,
    SYNTHETIC_CHARACTER_ENCODING,
};
pub use stage::{BoxFuture, Stage, StageKind, ORDER_STEP};
pub use types::{Request, Response, ResponseExt};
pub use url::UrlPathHelper;
