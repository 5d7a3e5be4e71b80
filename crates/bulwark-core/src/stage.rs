//! The stage trait and the canonical stage ordering.
//!
//! A stage is one unit of request processing in a security pipeline. Known
//! stages declare a [`StageKind`]; the kind fixes where the stage sits
//! relative to every other known stage. Custom stages have no kind and are
//! positioned relative to an anchor stage instead.
//!
//! # Canonical Order
//!
//! ```text
//! ChannelProcessing → ConcurrentSession → ContextPersistence → Logout
//!   → X509Authentication → PreAuthentication → CasAuthentication
//!   → FormLogin → OpenIdAuthentication → LoginPageGeneration
//!   → DigestAuthentication → BasicAuthentication → RequestCache
//!   → RequestWrapping → JaasIntegration → RememberMe → Anonymous
//!   → SessionManagement → ExceptionTranslation → AccessDecision → SwitchUser
//! ```

use crate::error::BulwarkResult;
use crate::invocation::Invocation;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A boxed future returned by stages.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Gap between the order values of consecutive kinds.
pub const ORDER_STEP: u32 = 100;

/// The closed set of stage kinds with a fixed relative position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StageKind {
    /// Redirects to the required transport channel.
    ChannelProcessing = 1,
    /// Enforces concurrent session limits.
    ConcurrentSession = 2,
    /// Loads and stores the security context between requests.
    ContextPersistence = 3,
    /// Handles logout requests.
    Logout = 4,
    /// Client-certificate authentication.
    X509Authentication = 5,
    /// Authentication established by an upstream component.
    PreAuthentication = 6,
    /// Central authentication service tickets.
    CasAuthentication = 7,
    /// Username and password form login.
    FormLogin = 8,
    /// OpenID authentication.
    OpenIdAuthentication = 9,
    /// Generates a default login page.
    LoginPageGeneration = 10,
    /// HTTP digest authentication.
    DigestAuthentication = 11,
    /// HTTP basic authentication.
    BasicAuthentication = 12,
    /// Replays a request saved before authentication.
    RequestCache = 13,
    /// Wraps the request with security-aware accessors.
    RequestWrapping = 14,
    /// Runs the rest of the chain under a JAAS subject.
    JaasIntegration = 15,
    /// Remember-me token authentication.
    RememberMe = 16,
    /// Assigns an anonymous principal.
    Anonymous = 17,
    /// Session fixation protection and session tracking.
    SessionManagement = 18,
    /// Turns security failures into responses.
    ExceptionTranslation = 19,
    /// Final access decision for the protected resource.
    AccessDecision = 20,
    /// Switches the current user.
    SwitchUser = 21,
}

impl StageKind {
    /// Number of known kinds.
    pub const COUNT: usize = 21;

    /// Returns the position of this kind in the canonical order.
    ///
    /// Values are spaced [`ORDER_STEP`] apart so that custom stages can be
    /// slotted in around them.
    #[must_use]
    pub const fn order(self) -> u32 {
        (self as u32) * ORDER_STEP
    }

    /// Returns the kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChannelProcessing => "channel_processing",
            Self::ConcurrentSession => "concurrent_session",
            Self::ContextPersistence => "context_persistence",
            Self::Logout => "logout",
            Self::X509Authentication => "x509_authentication",
            Self::PreAuthentication => "pre_authentication",
            Self::CasAuthentication => "cas_authentication",
            Self::FormLogin => "form_login",
            Self::OpenIdAuthentication => "openid_authentication",
            Self::LoginPageGeneration => "login_page_generation",
            Self::DigestAuthentication => "digest_authentication",
            Self::BasicAuthentication => "basic_authentication",
            Self::RequestCache => "request_cache",
            Self::RequestWrapping => "request_wrapping",
            Self::JaasIntegration => "jaas_integration",
            Self::RememberMe => "remember_me",
            Self::Anonymous => "anonymous",
            Self::SessionManagement => "session_management",
            Self::ExceptionTranslation => "exception_translation",
            Self::AccessDecision => "access_decision",
            Self::SwitchUser => "switch_user",
        }
    }

    /// Looks up a kind by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.name() == name)
    }

    /// Returns all kinds in canonical order.
    #[must_use]
    pub const fn all() -> [StageKind; Self::COUNT] {
        [
            Self::ChannelProcessing,
            Self::ConcurrentSession,
            Self::ContextPersistence,
            Self::Logout,
            Self::X509Authentication,
            Self::PreAuthentication,
            Self::CasAuthentication,
            Self::FormLogin,
            Self::OpenIdAuthentication,
            Self::LoginPageGeneration,
            Self::DigestAuthentication,
            Self::BasicAuthentication,
            Self::RequestCache,
            Self::RequestWrapping,
            Self::JaasIntegration,
            Self::RememberMe,
            Self::Anonymous,
            Self::SessionManagement,
            Self::ExceptionTranslation,
            Self::AccessDecision,
            Self::SwitchUser,
        ]
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of request processing.
///
/// Stages receive an [`Invocation`] holding the request, the response and
/// the rest of the chain. A stage continues processing by calling
/// [`Invocation::proceed`] exactly once, or short-circuits by writing the
/// response and returning without proceeding.
///
/// # Example
///
/// ```
/// use bulwark_core::{BoxFuture, BulwarkResult, Invocation, Stage, StageKind};
///
/// struct Audit;
///
/// impl Stage for Audit {
///     fn name(&self) -> &'static str {
///         "audit"
///     }
///
///     fn process<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>> {
///         Box::pin(async move {
///             tracing::debug!(url = %invocation.request_url(), "auditing request");
///             invocation.proceed().await
///         })
///     }
/// }
///
/// assert_eq!(Audit.kind(), None);
/// ```
pub trait Stage: Send + Sync + 'static {
    /// Returns the name of this stage, used for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns the canonical kind of this stage, `None` for custom stages.
    fn kind(&self) -> Option<StageKind> {
        None
    }

    /// Processes the request.
    fn process<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, BulwarkResult<()>>;
}
