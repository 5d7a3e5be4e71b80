//! Closure-backed stages.

use bulwark_core::{BoxFuture, BulwarkResult, Invocation, Stage, StageKind};
use std::fmt;

type StageBody = dyn for<'a> Fn(Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>> + Send + Sync;

/// A stage whose body is a closure.
///
/// The closure receives the invocation and must either proceed or write
/// the response itself.
///
/// ```
/// use bulwark_core::StageKind;
/// use bulwark_pipeline::FnStage;
///
/// let stage = FnStage::new("tag", |mut invocation| {
///     Box::pin(async move {
///         invocation.live_request_mut()?.set_attribute("tagged", true);
///         invocation.proceed().await
///     })
/// });
/// assert_eq!(bulwark_core::Stage::kind(&stage), None);
///
/// let anonymous = FnStage::new("anonymous", |invocation| invocation.proceed())
///     .with_kind(StageKind::Anonymous);
/// assert_eq!(bulwark_core::Stage::kind(&anonymous), Some(StageKind::Anonymous));
/// ```
pub struct FnStage {
    name: &'static str,
    kind: Option<StageKind>,
    body: Box<StageBody>,
}

impl FnStage {
    /// Creates a custom stage with no canonical kind.
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: for<'a> Fn(Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>> + Send + Sync + 'static,
    {
        Self {
            name,
            kind: None,
            body: Box::new(body),
        }
    }

    /// Gives the stage a canonical kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl Stage for FnStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> Option<StageKind> {
        self.kind
    }

    fn process<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>> {
        (self.body)(invocation)
    }
}

impl fmt::Debug for FnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
