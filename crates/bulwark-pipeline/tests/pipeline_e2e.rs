//! End-to-end pipeline tests.
//!
//! These drive live requests through built pipelines and check:
//!
//! 1. Stage execution order follows the canonical order
//! 2. Access decisions grant, deny or propagate evaluation errors
//! 3. Route-table introspection and path-variable binding
//! 4. Multi-pipeline dispatch
//! 5. Ordering properties over arbitrary builder sequences

use bulwark_authz::{ExpressionAttribute, RegoPredicateEngine};
use bulwark_config::ConfigLoader;
use bulwark_core::{
    BulwarkError, BulwarkResult, Invocation, LiveRequest, Response, ResponseExt, StageKind,
};
use bulwark_matcher::{PathPatternMatcher, RouteTableIntrospector};
use bulwark_pipeline::{
    AccessDecisionStage, Anchor, AuthorizeRequests, FnStage, PipelineBuilder, PipelineProxy,
    SecurityPipeline, SharedIntrospector, SharedPredicateEngine, ACCESS_DECISION_ATTRIBUTE,
};
use bulwark_router::{MethodRouter, Router};
use bytes::Bytes;
use http::{Method, Request as HttpRequest, StatusCode};
use http_body_util::Full;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<&'static str>>>;

/// Creates a live request served from the root context.
fn make_request(path: &str, method: Method) -> LiveRequest {
    LiveRequest::new(
        HttpRequest::builder()
            .method(method)
            .uri(path)
            .header("host", "bank.example.com")
            .body(Full::new(Bytes::new()))
            .unwrap(),
    )
}

/// Terminal handler marking the response as served.
fn handler(_request: &mut LiveRequest, response: &mut Response) -> BulwarkResult<()> {
    *response.status_mut() = StatusCode::ACCEPTED;
    Ok(())
}

/// A pass-through stage that records its name.
fn recording(name: &'static str, log: &Log) -> FnStage {
    let log = Arc::clone(log);
    FnStage::new(name, move |invocation| {
        log.lock().unwrap().push(name);
        invocation.proceed()
    })
}

fn engine() -> SharedPredicateEngine {
    SharedPredicateEngine(Arc::new(RegoPredicateEngine::new()))
}

fn decision(request: &LiveRequest) -> Option<&str> {
    request.attributes().get(ACCESS_DECISION_ATTRIBUTE).and_then(Value::as_str)
}

/// Builds a pipeline with several canonical stages registered out of order,
/// plus an access-decision stage guarding `/admin/**`.
fn build_full_pipeline(log: &Log) -> SecurityPipeline {
    let mut builder = PipelineBuilder::new();
    builder.set_shared_object(engine());
    builder
        .add_stage(recording("anonymous", log).with_kind(StageKind::Anonymous))
        .unwrap()
        .add_stage(recording("channel", log).with_kind(StageKind::ChannelProcessing))
        .unwrap()
        .add_stage(recording("exceptions", log).with_kind(StageKind::ExceptionTranslation))
        .unwrap()
        .add_stage(recording("context", log).with_kind(StageKind::ContextPersistence))
        .unwrap()
        .add_stage_after(recording("audit", log), StageKind::ContextPersistence)
        .unwrap();
    builder.add_configurer(
        AuthorizeRequests::new()
            .rule("/admin/**", r#"input.request.attributes.role == "admin""#)
            .rule("/**", "true"),
    );
    builder.build().unwrap()
}

// =============================================================================
// Stage Ordering Tests
// =============================================================================

#[test]
fn test_stage_ordering_verification() {
    let log = Log::default();
    let pipeline = build_full_pipeline(&log);
    assert_eq!(
        pipeline.stage_names(),
        vec!["channel", "context", "audit", "anonymous", "exceptions", "access_decision"]
    );
}

#[tokio::test]
async fn test_stage_execution_order() {
    let log = Log::default();
    let pipeline = build_full_pipeline(&log);

    let mut request = make_request("/accounts", Method::GET);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["channel", "context", "audit", "anonymous", "exceptions"]
    );
    assert_eq!(decision(&request), Some("granted"));
}

#[tokio::test]
async fn test_stage_can_short_circuit() {
    let mut builder = PipelineBuilder::new();
    builder
        .add_stage(
            FnStage::new("channel", |mut invocation| {
                Box::pin(async move {
                    if let Some(response) = invocation.response_mut() {
                        *response = Response::error(StatusCode::MISDIRECTED_REQUEST, "use https");
                    }
                    Ok(())
                })
            })
            .with_kind(StageKind::ChannelProcessing),
        )
        .unwrap();
    let pipeline = builder.build().unwrap();

    let mut request = make_request("/accounts", Method::GET);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MISDIRECTED_REQUEST);
}

#[tokio::test]
async fn test_stage_error_propagates() {
    let mut builder = PipelineBuilder::new();
    builder
        .add_stage(
            FnStage::new("logout", |_invocation| {
                Box::pin(async { Err(BulwarkError::configuration("logout handler missing")) })
            })
            .with_kind(StageKind::Logout),
        )
        .unwrap();
    let pipeline = builder.build().unwrap();

    let mut request = make_request("/logout", Method::POST);
    let mut response = Response::empty();
    let err = pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_pipeline_reaches_handler() {
    let pipeline = PipelineBuilder::new().build().unwrap();
    let mut request = make_request("/", Method::GET);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

// =============================================================================
// Access Decision Tests
// =============================================================================

#[tokio::test]
async fn test_admin_access_granted() {
    let log = Log::default();
    let pipeline = build_full_pipeline(&log);

    let mut request = make_request("/admin/users", Method::GET);
    request.set_attribute("role", "admin");
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(decision(&request), Some("granted"));
}

#[tokio::test]
async fn test_admin_access_denied() {
    let log = Log::default();
    let pipeline = build_full_pipeline(&log);

    let mut request = make_request("/admin/users", Method::GET);
    request.set_attribute("role", "teller");
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(decision(&request), Some("denied"));
}

#[tokio::test]
async fn test_evaluation_error_is_not_a_decision() {
    let mut builder = PipelineBuilder::new();
    builder
        .add_stage(
            AccessDecisionStage::new(Arc::new(RegoPredicateEngine::new())).with_rule(
                Arc::new(PathPatternMatcher::new("/**").unwrap()),
                ExpressionAttribute::new("input.request.uri"),
            ),
        )
        .unwrap();
    let pipeline = builder.build().unwrap();

    let mut request = make_request("/accounts", Method::GET);
    let mut response = Response::empty();
    let err = pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap_err();

    assert!(err.is_evaluation());
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(decision(&request), None);
}

#[tokio::test]
async fn test_context_path_is_not_part_of_lookup_path() {
    let log = Log::default();
    let pipeline = build_full_pipeline(&log);

    let inner = HttpRequest::builder()
        .uri("/bank/admin/users")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let mut request = LiveRequest::with_context_path(inner, "/bank").unwrap();
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_privilege_check_with_synthetic_invocation() {
    let stage = AccessDecisionStage::new(Arc::new(RegoPredicateEngine::new()))
        .with_rule(
            Arc::new(PathPatternMatcher::new("/admin/**").unwrap()),
            ExpressionAttribute::new(r#"input.request.context_path == "/bank""#),
        );

    let inside = Invocation::for_context_path("/bank", "/admin/users", Method::GET);
    assert!(stage.is_allowed(&inside).unwrap());

    let default_context = Invocation::for_path("/admin/users", Method::GET);
    assert!(!stage.is_allowed(&default_context).unwrap());
}

// =============================================================================
// Routing Introspection Tests
// =============================================================================

fn build_routed_pipeline() -> SecurityPipeline {
    let mut router = Router::new();
    router
        .insert("/orders/{id}", MethodRouter::new().get("showOrder").delete("cancelOrder"))
        .unwrap();
    let introspector = RouteTableIntrospector::new(Arc::new(router));

    let config = ConfigLoader::new()
        .with_string(
            r#"
            [[authorization.rules]]
            pattern = "/orders/{id}"
            method = "DELETE"
            access = "false"

            [[authorization.rules]]
            pattern = "/orders/{id}"
            access = 'input.variables.id == "42"'
            bind_variables = true
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();

    let mut builder = PipelineBuilder::new();
    builder
        .set_shared_object(engine())
        .set_shared_object(SharedIntrospector(Arc::new(introspector)))
        .set_shared_object(config.matching.path_helper());
    builder.add_configurer(AuthorizeRequests::from_config(&config.authorization));
    builder.build().unwrap()
}

#[tokio::test]
async fn test_bound_path_variable_grants() {
    let pipeline = build_routed_pipeline();

    let mut request = make_request("/orders/42", Method::GET);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_bound_path_variable_denies() {
    let pipeline = build_routed_pipeline();

    let mut request = make_request("/orders/7", Method::GET);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_method_specific_rule_wins() {
    let pipeline = build_routed_pipeline();

    let mut request = make_request("/orders/42", Method::DELETE);
    let mut response = Response::empty();
    pipeline
        .process(&mut request, &mut response, &handler)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[tokio::test]
async fn test_proxy_dispatches_to_first_match() {
    let api_log = Log::default();
    let web_log = Log::default();

    let mut api = PipelineBuilder::new();
    api.request_matcher(Arc::new(PathPatternMatcher::new("/api/**").unwrap()))
        .add_stage(recording("api_basic", &api_log).with_kind(StageKind::BasicAuthentication))
        .unwrap();

    let mut web = PipelineBuilder::new();
    web.add_stage(recording("web_form", &web_log).with_kind(StageKind::FormLogin))
        .unwrap();

    let proxy = PipelineProxy::new(vec![api.build().unwrap(), web.build().unwrap()]);

    let mut request = make_request("/api/accounts", Method::GET);
    let mut response = Response::empty();
    proxy.process(&mut request, &mut response, &handler).await.unwrap();

    let mut request = make_request("/login", Method::POST);
    let mut response = Response::empty();
    proxy.process(&mut request, &mut response, &handler).await.unwrap();

    assert_eq!(*api_log.lock().unwrap(), vec!["api_basic"]);
    assert_eq!(*web_log.lock().unwrap(), vec!["web_form"]);
}

#[tokio::test]
async fn test_proxy_without_match_calls_handler() {
    let mut api = PipelineBuilder::new();
    api.request_matcher(Arc::new(PathPatternMatcher::new("/api/**").unwrap()));
    let proxy = PipelineProxy::new(vec![api.build().unwrap()]);

    let mut request = make_request("/health", Method::GET);
    assert!(proxy.pipeline_for(&request).is_none());

    let mut response = Response::empty();
    proxy.process(&mut request, &mut response, &handler).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

// =============================================================================
// Ordering Properties
// =============================================================================

const CUSTOM_NAMES: [&str; 6] = ["custom0", "custom1", "custom2", "custom3", "custom4", "custom5"];

fn passthrough(name: &'static str) -> FnStage {
    FnStage::new(name, |invocation| invocation.proceed())
}

/// Replays a builder sequence: canonical kinds first, then custom stages
/// anchored on already-registered stages.
fn build_sequence(
    kinds: &[StageKind],
    customs: &[(bool, prop::sample::Index)],
) -> BulwarkResult<Vec<&'static str>> {
    let mut builder = PipelineBuilder::new();
    let mut registered: Vec<&'static str> = Vec::new();

    for kind in kinds {
        builder.add_stage(passthrough(kind.name()).with_kind(*kind))?;
        registered.push(kind.name());
    }
    if !registered.is_empty() {
        for (name, (before, index)) in CUSTOM_NAMES.iter().zip(customs) {
            let anchor = Anchor::Name(registered[index.index(registered.len())]);
            if *before {
                builder.add_stage_before(passthrough(name), anchor)?;
            } else {
                builder.add_stage_after(passthrough(name), anchor)?;
            }
            registered.push(name);
        }
    }

    Ok(builder.build()?.stage_names())
}

fn kinds_strategy() -> impl Strategy<Value = Vec<StageKind>> {
    prop::sample::subsequence(StageKind::all().to_vec(), 0..=StageKind::COUNT).prop_shuffle()
}

proptest! {
    #[test]
    fn canonical_build_never_fails_and_is_ordered(kinds in kinds_strategy()) {
        let names = build_sequence(&kinds, &[]).unwrap();

        let mut expected = kinds.clone();
        expected.sort();
        let expected: Vec<&'static str> = expected.iter().map(|kind| kind.name()).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn anchored_stages_keep_canonical_order(
        kinds in kinds_strategy(),
        customs in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 0..6),
    ) {
        let names = build_sequence(&kinds, &customs).unwrap();

        let canonical: Vec<StageKind> = names
            .iter()
            .filter_map(|name| StageKind::from_name(name))
            .collect();
        prop_assert!(canonical.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(canonical.len(), kinds.len());
    }

    #[test]
    fn build_is_deterministic(
        kinds in kinds_strategy(),
        customs in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 0..6),
    ) {
        let first = build_sequence(&kinds, &customs).unwrap();
        let second = build_sequence(&kinds, &customs).unwrap();
        prop_assert_eq!(first, second);
    }
}
