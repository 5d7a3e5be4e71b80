//! Access-decision stage.
//!
//! Runs last among the security stages, right after exception translation:
//!
//! ```text
//! ... → SessionManagement → ExceptionTranslation → [AccessDecision] → SwitchUser
//! ```
//!
//! The stage holds an ordered list of rules. The first rule whose matcher
//! accepts the request decides: its [`ExpressionAttribute`] is evaluated
//! against an [`EvaluationContext`] built from the invocation. Granted
//! requests proceed; denied requests get a `403` JSON error and the chain
//! stops. Requests no rule matches proceed unchecked. Evaluation failures
//! propagate and are never turned into a decision.

use crate::builder::PipelineBuilder;
use crate::registry::Configurer;
use bulwark_authz::{EvaluationContext, ExpressionAttribute, PredicateEngine};
use bulwark_config::AuthorizationConfig;
use bulwark_core::{
    BoxFuture, BulwarkError, BulwarkResult, Invocation, Response, ResponseExt, Stage, StageKind,
    UrlPathHelper,
};
use bulwark_matcher::{HandlerIntrospector, Params, RequestMatcher, RoutedRequestMatcher};
use bulwark_telemetry::metrics::record_access_decision;
use http::{Method, StatusCode};
use std::sync::Arc;

/// Request attribute recording the decision (`"granted"` or `"denied"`).
pub const ACCESS_DECISION_ATTRIBUTE: &str = "bulwark.access_decision";

/// A request matcher paired with the predicate guarding it.
#[derive(Debug, Clone)]
pub struct AccessRule {
    matcher: Arc<dyn RequestMatcher>,
    attribute: ExpressionAttribute,
    bind_variables: bool,
}

impl AccessRule {
    /// Creates a rule.
    pub fn new(matcher: Arc<dyn RequestMatcher>, attribute: ExpressionAttribute) -> Self {
        Self {
            matcher,
            attribute,
            bind_variables: false,
        }
    }

    /// Exposes the variables captured by the matcher to the predicate under
    /// `variables`.
    #[must_use]
    pub fn binding_variables(mut self) -> Self {
        self.bind_variables = true;
        self
    }

    /// Returns true if captured variables reach the predicate.
    pub fn binds_variables(&self) -> bool {
        self.bind_variables
    }

    /// Returns the matcher.
    pub fn matcher(&self) -> &Arc<dyn RequestMatcher> {
        &self.matcher
    }

    /// Returns the predicate attribute.
    pub fn attribute(&self) -> &ExpressionAttribute {
        &self.attribute
    }
}

/// Grants or denies access using the first matching rule.
///
/// # Example
///
/// ```
/// use bulwark_authz::{ExpressionAttribute, RegoPredicateEngine};
/// use bulwark_core::Invocation;
/// use bulwark_matcher::PathPatternMatcher;
/// use bulwark_pipeline::AccessDecisionStage;
/// use http::Method;
/// use std::sync::Arc;
///
/// let stage = AccessDecisionStage::new(Arc::new(RegoPredicateEngine::new())).with_rule(
///     Arc::new(PathPatternMatcher::new("/admin/**").unwrap()),
///     ExpressionAttribute::new("false"),
/// );
///
/// let admin = Invocation::for_path("/admin/users", Method::GET);
/// assert!(!stage.is_allowed(&admin).unwrap());
///
/// let public = Invocation::for_path("/public", Method::GET);
/// assert!(stage.is_allowed(&public).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct AccessDecisionStage {
    rules: Vec<AccessRule>,
    engine: Arc<dyn PredicateEngine>,
}

impl AccessDecisionStage {
    /// Creates a stage with no rules.
    pub fn new(engine: Arc<dyn PredicateEngine>) -> Self {
        Self {
            rules: Vec::new(),
            engine,
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(self, matcher: Arc<dyn RequestMatcher>, attribute: ExpressionAttribute) -> Self {
        self.with_access_rule(AccessRule::new(matcher, attribute))
    }

    /// Appends a prepared rule.
    #[must_use]
    pub fn with_access_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the rules in evaluation order.
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Returns the first rule matching the invocation's request.
    pub fn rule_for(&self, invocation: &Invocation<'_>) -> Option<&AccessRule> {
        let request = invocation.request();
        self.rules.iter().find(|rule| rule.matcher.matches(request))
    }

    /// Evaluates the first matching rule; `None` when no rule matches.
    ///
    /// Each rule's matcher is consulted at most once per decision.
    pub fn decide(&self, invocation: &Invocation<'_>) -> BulwarkResult<Option<bool>> {
        let Some((rule, variables)) = self.matching_rule(invocation) else {
            return Ok(None);
        };

        let mut context = EvaluationContext::for_invocation(invocation);
        if let Some(variables) = variables {
            context.bind_variables(&variables);
        }
        rule.attribute
            .evaluate(self.engine.as_ref(), context, invocation)
            .map(Some)
    }

    /// Like [`rule_for`](Self::rule_for), also returning the captured
    /// variables of a rule that binds them.
    fn matching_rule(&self, invocation: &Invocation<'_>) -> Option<(&AccessRule, Option<Params>)> {
        let request = invocation.request();
        self.rules.iter().find_map(|rule| {
            if rule.bind_variables {
                rule.matcher.match_request(request).map(|variables| (rule, Some(variables)))
            } else {
                rule.matcher.matches(request).then_some((rule, None))
            }
        })
    }

    /// Returns whether the invocation would be let through.
    ///
    /// Works on synthetic invocations, so privileges can be checked without
    /// a live request.
    pub fn is_allowed(&self, invocation: &Invocation<'_>) -> BulwarkResult<bool> {
        Ok(self.decide(invocation)?.unwrap_or(true))
    }
}

impl Stage for AccessDecisionStage {
    fn name(&self) -> &'static str {
        "access_decision"
    }

    fn kind(&self) -> Option<StageKind> {
        Some(StageKind::AccessDecision)
    }

    fn process<'a>(&'a self, mut invocation: Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>> {
        Box::pin(async move {
            let Some(granted) = self.decide(&invocation)? else {
                tracing::debug!(url = %invocation.request_url(), "no access rule matched");
                return invocation.proceed().await;
            };

            record_access_decision(granted);
            let outcome = if granted { "granted" } else { "denied" };
            invocation
                .live_request_mut()?
                .set_attribute(ACCESS_DECISION_ATTRIBUTE, outcome);

            if granted {
                tracing::debug!(url = %invocation.request_url(), "access granted");
                return invocation.proceed().await;
            }

            tracing::warn!(
                http.method = %invocation.method(),
                url = %invocation.request_url(),
                "access denied"
            );
            if let Some(response) = invocation.response_mut() {
                *response = Response::json_error(StatusCode::FORBIDDEN, "ACCESS_DENIED", "access denied");
            }
            Ok(())
        })
    }
}

/// Shared-object key for the predicate engine used by [`AuthorizeRequests`].
#[derive(Debug, Clone)]
pub struct SharedPredicateEngine(pub Arc<dyn PredicateEngine>);

/// Shared-object key for the routing introspector used by
/// [`AuthorizeRequests`] when building rule matchers.
#[derive(Debug, Clone)]
pub struct SharedIntrospector(pub Arc<dyn HandlerIntrospector>);

/// One access rule before its matcher is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    /// Path pattern.
    pub pattern: String,
    /// Exact method constraint.
    pub method: Option<String>,
    /// Exact servlet path constraint.
    pub servlet_path: Option<String>,
    /// Predicate expression.
    pub expression: String,
    /// Expose path variables to the predicate under `variables`.
    pub bind_variables: bool,
}

impl RuleDefinition {
    /// Creates a rule without constraints.
    pub fn new(pattern: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            method: None,
            servlet_path: None,
            expression: expression.into(),
            bind_variables: false,
        }
    }
}

/// Registers an [`AccessDecisionStage`] built from rule definitions.
///
/// Needs a [`SharedPredicateEngine`] shared object. When a
/// [`SharedIntrospector`] is registered, rule matchers consult it; a shared
/// [`UrlPathHelper`] replaces the default lookup-path rules.
///
/// ```
/// use bulwark_authz::RegoPredicateEngine;
/// use bulwark_core::StageKind;
/// use bulwark_pipeline::{AuthorizeRequests, PipelineBuilder, SharedPredicateEngine};
/// use std::sync::Arc;
///
/// let mut builder = PipelineBuilder::new();
/// builder.set_shared_object(SharedPredicateEngine(Arc::new(RegoPredicateEngine::new())));
/// builder.add_configurer(
///     AuthorizeRequests::new()
///         .rule("/admin/**", r#"input.request.attributes.role == "admin""#)
///         .rule("/**", "true"),
/// );
///
/// let pipeline = builder.build().unwrap();
/// assert_eq!(pipeline.stage_names(), vec!["access_decision"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AuthorizeRequests {
    rules: Vec<RuleDefinition>,
    case_sensitive: Option<bool>,
    path_helper: Option<UrlPathHelper>,
}

impl AuthorizeRequests {
    /// Creates a configurer with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the rule list from configuration.
    ///
    /// Returns an empty configurer when authorization is disabled.
    #[must_use]
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        if !config.enabled {
            return Self::new();
        }
        let rules = config
            .rules
            .iter()
            .map(|rule| RuleDefinition {
                pattern: rule.pattern.clone(),
                method: rule.method.clone(),
                servlet_path: rule.servlet_path.clone(),
                expression: rule.access.clone(),
                bind_variables: rule.bind_variables,
            })
            .collect();
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Appends a rule for `pattern`.
    #[must_use]
    pub fn rule(mut self, pattern: impl Into<String>, expression: impl Into<String>) -> Self {
        self.rules.push(RuleDefinition::new(pattern, expression));
        self
    }

    /// Appends a fully specified rule.
    #[must_use]
    pub fn rule_definition(mut self, definition: RuleDefinition) -> Self {
        self.rules.push(definition);
        self
    }

    /// Sets case sensitivity of the rule patterns.
    #[must_use]
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Sets the lookup-path rules used by the rule matchers.
    #[must_use]
    pub fn path_helper(mut self, path_helper: UrlPathHelper) -> Self {
        self.path_helper = Some(path_helper);
        self
    }

    /// Returns the rule definitions.
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    fn build_matcher(
        &self,
        definition: &RuleDefinition,
        introspector: Option<&SharedIntrospector>,
        path_helper: &UrlPathHelper,
    ) -> BulwarkResult<RoutedRequestMatcher> {
        let mut builder = RoutedRequestMatcher::builder(definition.pattern.clone())
            .path_helper(path_helper.clone())
            .case_sensitive(self.case_sensitive.unwrap_or(true));

        if let Some(method) = &definition.method {
            let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
                BulwarkError::configuration(format!(
                    "rule '{}' has an invalid method '{method}'",
                    definition.pattern
                ))
            })?;
            builder = builder.method(method);
        }
        if let Some(servlet_path) = &definition.servlet_path {
            builder = builder.servlet_path(servlet_path.clone());
        }
        if let Some(SharedIntrospector(introspector)) = introspector {
            builder = builder.introspector(Arc::clone(introspector));
        }
        builder.build()
    }
}

impl Configurer for AuthorizeRequests {
    fn configure(&mut self, builder: &mut PipelineBuilder) -> BulwarkResult<()> {
        if self.rules.is_empty() {
            tracing::debug!("no access rules configured");
            return Ok(());
        }

        let stage = self.build_stage(builder)?;
        builder.add_stage(stage)?;
        Ok(())
    }
}

impl AuthorizeRequests {
    /// Builds the stage from the rule definitions and the builder's shared
    /// objects.
    fn build_stage(&self, builder: &PipelineBuilder) -> BulwarkResult<AccessDecisionStage> {
        let SharedPredicateEngine(engine) = builder
            .shared_object::<SharedPredicateEngine>()
            .map(|shared| shared.as_ref().clone())
            .ok_or_else(|| {
                BulwarkError::configuration("access rules need a SharedPredicateEngine shared object")
            })?;
        let introspector = builder.shared_object::<SharedIntrospector>();
        let path_helper = match &self.path_helper {
            Some(helper) => helper.clone(),
            None => builder
                .shared_object::<UrlPathHelper>()
                .map(|helper| helper.as_ref().clone())
                .unwrap_or_default(),
        };

        let mut stage = AccessDecisionStage::new(engine);
        for definition in &self.rules {
            let matcher: Arc<dyn RequestMatcher> =
                Arc::new(self.build_matcher(definition, introspector.as_deref(), &path_helper)?);

            let mut rule = AccessRule::new(matcher, ExpressionAttribute::new(definition.expression.clone()));
            if definition.bind_variables {
                rule = rule.binding_variables();
            }
            tracing::debug!(pattern = %definition.pattern, expression = %definition.expression, "access rule registered");
            stage = stage.with_access_rule(rule);
        }
        Ok(stage)
    }
}
