//! # Bulwark Pipeline
//!
//! Ordered security pipeline assembly and dispatch.
//!
//! A [`PipelineBuilder`] collects stages, [`Configurer`]s and shared
//! objects, then builds an immutable [`SecurityPipeline`]. Stages with a
//! canonical [`StageKind`](bulwark_core::StageKind) always run in the
//! canonical relative order; custom stages are placed immediately before or
//! after an existing stage.
//!
//! ```text
//! Request → ChannelProcessing → … → ExceptionTranslation → AccessDecision → … → Terminal
//!                                     ↑ custom stages slot in next to their anchors
//! ```
//!
//! ## Key Features
//!
//! - **Canonical order**: known stages cannot be reordered by custom ones
//! - **Contradiction detection**: inconsistent placements fail at build time
//! - **Type-keyed registries**: configurers and shared objects are looked up
//!   by exact type
//! - **Snapshots**: a built pipeline is unaffected by later builder changes
//!
//! ## Example
//!
//! ```
//! use bulwark_core::StageKind;
//! use bulwark_pipeline::{FnStage, PipelineBuilder};
//!
//! let mut builder = PipelineBuilder::new();
//! builder
//!     .add_stage(FnStage::new("anonymous", |i| i.proceed()).with_kind(StageKind::Anonymous))?
//!     .add_stage(FnStage::new("context", |i| i.proceed()).with_kind(StageKind::ContextPersistence))?;
//!
//! let pipeline = builder.build()?;
//! assert_eq!(pipeline.stage_names(), vec!["context", "anonymous"]);
//! # Ok::<(), bulwark_core::BulwarkError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
mod order;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod stages;

pub use builder::{Anchor, PipelineBuilder};
pub use pipeline::{PipelineProxy, SecurityPipeline};
pub use registry::{AsAny, Configurer, SharedObjects};
pub use stage::FnStage;
pub use stages::{
    AccessDecisionStage, AccessRule, AuthorizeRequests, RuleDefinition, SharedIntrospector,
    SharedPredicateEngine, ACCESS_DECISION_ATTRIBUTE,
};
