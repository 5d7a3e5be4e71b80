//! Built pipelines and multi-pipeline dispatch.
//!
//! A [`SecurityPipeline`] is immutable once built and can be shared across
//! tasks. Each request runs the stages in order through a [`Chain`]; a
//! stage either proceeds or writes the response and stops.

use bulwark_core::{BulwarkResult, Chain, LiveRequest, RequestParts, Response, Stage, Terminal};
use bulwark_matcher::RequestMatcher;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// An ordered, immutable sequence of stages guarding a set of requests.
#[derive(Clone)]
pub struct SecurityPipeline {
    matcher: Arc<dyn RequestMatcher>,
    stages: Vec<Arc<dyn Stage>>,
}

impl SecurityPipeline {
    /// Creates a pipeline from stages that are already ordered.
    #[must_use]
    pub fn new(matcher: Arc<dyn RequestMatcher>, stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { matcher, stages }
    }

    /// Returns true if this pipeline handles `request`.
    #[must_use]
    pub fn matches(&self, request: &dyn RequestParts) -> bool {
        self.matcher.matches(request)
    }

    /// Returns the matcher selecting requests for this pipeline.
    #[must_use]
    pub fn request_matcher(&self) -> &Arc<dyn RequestMatcher> {
        &self.matcher
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs `request` through every stage, then `terminal`.
    ///
    /// Stops early when a stage does not proceed. Stage errors propagate
    /// unchanged.
    pub async fn process(
        &self,
        request: &mut LiveRequest,
        response: &mut Response,
        terminal: &Terminal,
    ) -> BulwarkResult<()> {
        let span = tracing::debug_span!(
            "security_pipeline",
            http.method = %request.method(),
            http.path = %request.request_uri(),
            stages = self.stages.len(),
        );
        Chain::new(&self.stages, terminal)
            .do_next(request, response)
            .instrument(span)
            .await
    }
}

impl fmt::Debug for SecurityPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityPipeline")
            .field("matcher", &self.matcher)
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Dispatches each request to the first pipeline that matches it.
///
/// Requests that no pipeline matches go straight to the terminal.
#[derive(Debug, Clone, Default)]
pub struct PipelineProxy {
    pipelines: Vec<SecurityPipeline>,
}

impl PipelineProxy {
    /// Creates a proxy over `pipelines`, tried in order.
    #[must_use]
    pub fn new(pipelines: Vec<SecurityPipeline>) -> Self {
        Self { pipelines }
    }

    /// Appends a pipeline, tried after the existing ones.
    pub fn push(&mut self, pipeline: SecurityPipeline) {
        self.pipelines.push(pipeline);
    }

    /// Returns the pipelines in dispatch order.
    #[must_use]
    pub fn pipelines(&self) -> &[SecurityPipeline] {
        &self.pipelines
    }

    /// Returns the pipeline that would handle `request`.
    #[must_use]
    pub fn pipeline_for(&self, request: &dyn RequestParts) -> Option<&SecurityPipeline> {
        self.pipelines.iter().find(|pipeline| pipeline.matches(request))
    }

    /// Runs `request` through the first matching pipeline.
    pub async fn process(
        &self,
        request: &mut LiveRequest,
        response: &mut Response,
        terminal: &Terminal,
    ) -> BulwarkResult<()> {
        match self.pipeline_for(&*request) {
            Some(pipeline) => pipeline.process(request, response, terminal).await,
            None => {
                tracing::debug!(http.path = %request.request_uri(), "no security pipeline matched");
                terminal(request, response)
            }
        }
    }
}
