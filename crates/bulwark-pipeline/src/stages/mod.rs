//! Built-in stages.

pub mod authorization;

pub use authorization::{
    AccessDecisionStage, AccessRule, AuthorizeRequests, RuleDefinition, SharedIntrospector,
    SharedPredicateEngine, ACCESS_DECISION_ATTRIBUTE,
};
