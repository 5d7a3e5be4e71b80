//! Evaluation contexts handed to the predicate engine.

use crate::enricher::VARIABLES_KEY;
use bulwark_core::{Invocation, RequestParts};
use bulwark_matcher::Params;
use serde_json::{Map, Value};

/// Named values a predicate is evaluated against.
///
/// The context serializes to a JSON object. Request facts live under
/// `request`; enrichers add their own top-level keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    values: Map<String, Value>,
}

impl EvaluationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context holding the request facts of `request`.
    ///
    /// `request.attributes` is empty since [`RequestParts`] cannot enumerate
    /// attributes; use [`for_invocation`](Self::for_invocation) to include
    /// them.
    pub fn for_request(request: &dyn RequestParts) -> Self {
        let mut context = Self::new();
        context.set("request", request_facts(request, Map::new()));
        context
    }

    /// Creates a context from an invocation, including live request
    /// attributes.
    pub fn for_invocation(invocation: &Invocation<'_>) -> Self {
        let attributes: Map<String, Value> = invocation
            .live_request()
            .map(|request| {
                request
                    .attributes()
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut context = Self::new();
        context.set("request", request_facts(invocation.request(), attributes));
        context
    }

    /// Sets a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Sets a value and returns the context.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Merges captured path variables into the object under
    /// [`VARIABLES_KEY`]. A new binding replaces an entry of the same name.
    pub fn bind_variables(&mut self, variables: &Params) {
        let mut bound = match self.values.get(VARIABLES_KEY) {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        for (name, value) in variables {
            bound.insert(name.to_string(), Value::String(value.to_string()));
        }
        self.set(VARIABLES_KEY, Value::Object(bound));
    }

    /// Returns a value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a mutable value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    /// Returns true if `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of top-level values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the context as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Converts the context into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

fn request_facts(request: &dyn RequestParts, attributes: Map<String, Value>) -> Value {
    let mut facts = Map::new();
    facts.insert("method".into(), request.method().as_str().into());
    facts.insert("uri".into(), request.request_uri().into());
    facts.insert("context_path".into(), request.context_path().into());
    facts.insert("servlet_path".into(), request.servlet_path().into());
    facts.insert("path_info".into(), request.path_info().into());
    facts.insert("query".into(), request.query_string().into());
    facts.insert("attributes".into(), Value::Object(attributes));
    Value::Object(facts)
}
