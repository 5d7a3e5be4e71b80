//! # Bulwark
//!
//! **Ordered Security Filter Chains for HTTP Services**
//!
//! Bulwark assembles security pipelines from stages and runs requests
//! through them before they reach a handler:
//!
//! - 🔗 **Canonical Ordering** – Known stages always run in a fixed relative order
//! - 🧭 **Route-Aware Matching** – Rule patterns agree with how requests are routed
//! - 🛡️ **Expression Authorization** – Access rules are Rego predicates over request facts
//! - ⚙️ **Configurable** – Rules and matching options load from TOML, JSON or the environment
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulwark::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ConfigLoader::new().with_defaults().with_file("bulwark.toml")?.load()?;
//! init_logging(&config.logging.log_config())?;
//!
//! let mut builder = PipelineBuilder::new();
//! builder
//!     .set_shared_object(SharedPredicateEngine(Arc::new(RegoPredicateEngine::new())))
//!     .set_shared_object(config.matching.path_helper());
//! builder.add_configurer(AuthorizeRequests::from_config(&config.authorization));
//!
//! let proxy = PipelineProxy::new(vec![builder.build()?]);
//! proxy.process(&mut request, &mut response, &handler).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → PipelineProxy → first matching SecurityPipeline
//!             ↓
//!           ChannelProcessing → … → ExceptionTranslation → AccessDecision → … → Handler
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use bulwark_core as core;

// Re-export router types
pub use bulwark_router as router;

// Re-export request matchers
pub use bulwark_matcher as matcher;

// Re-export authorization types
pub use bulwark_authz as authz;

// Re-export pipeline assembly
pub use bulwark_pipeline as pipeline;

// Re-export configuration
pub use bulwark_config as config;

// Re-export observability
pub use bulwark_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use bulwark::prelude::*;
///
/// let pipeline = PipelineBuilder::new().build()?;
/// assert_eq!(pipeline.stage_count(), 0);
/// # Ok::<(), BulwarkError>(())
/// ```
pub mod prelude {
    pub use bulwark_core::{
        BoxFuture, BulwarkError, BulwarkResult, Invocation, LiveRequest, RequestParts, Response,
        ResponseExt, Stage, StageKind, Terminal, UrlPathHelper,
    };

    // Re-export matchers
    pub use bulwark_matcher::{
        AnyRequestMatcher, HandlerIntrospector, PathPatternMatcher, RequestMatcher,
        RouteTableIntrospector, RoutedRequestMatcher,
    };

    // Re-export routing
    pub use bulwark_router::{MethodRouter, Router};

    // Re-export authorization
    pub use bulwark_authz::{
        EvaluationContext, ExpressionAttribute, PathVariablesEnricher, PredicateEngine,
        RegoPredicateEngine,
    };

    // Re-export pipeline assembly
    pub use bulwark_pipeline::{
        AccessDecisionStage, Anchor, AuthorizeRequests, Configurer, FnStage, PipelineBuilder,
        PipelineProxy, SecurityPipeline, SharedIntrospector, SharedPredicateEngine,
    };

    // Re-export configuration
    pub use bulwark_config::{BulwarkConfig, ConfigLoader};

    // Re-export observability
    pub use bulwark_telemetry::{init_logging, init_metrics, LogConfig};
}
