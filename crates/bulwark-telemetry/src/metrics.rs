//! Prometheus metrics for Bulwark.
//!
//! The recorder is installed without an HTTP listener. Hosts expose the
//! rendered text through their own endpoint via [`render_metrics`].

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Routed-matcher fallback counter name.
pub const MATCHER_FALLBACK_TOTAL: &str = "bulwark_matcher_fallback_total";

/// Access decision counter name.
pub const ACCESS_DECISIONS_TOTAL: &str = "bulwark_access_decisions_total";

/// Installs the global Prometheus recorder.
///
/// Calling this again after a successful install is a no-op.
pub fn init_metrics() -> TelemetryResult<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        MATCHER_FALLBACK_TOTAL,
        "Routed request matcher fallbacks to plain pattern matching"
    );
    describe_counter!(ACCESS_DECISIONS_TOTAL, "Access decisions by result");
}

/// Records a routed-matcher fallback.
///
/// `reason` is one of `no_introspector`, `no_mapping` or `resolve_error`.
pub fn record_matcher_fallback(reason: &'static str) {
    counter!(MATCHER_FALLBACK_TOTAL, "reason" => reason).increment(1);
}

/// Records an access decision.
pub fn record_access_decision(allowed: bool) {
    let result = if allowed { "granted" } else { "denied" };
    counter!(ACCESS_DECISIONS_TOTAL, "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_dont_panic() {
        record_matcher_fallback("no_introspector");
        record_matcher_fallback("resolve_error");
        record_access_decision(true);
        record_access_decision(false);
    }

    #[test]
    fn test_init_metrics_renders_counters() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        record_matcher_fallback("no_mapping");
        record_access_decision(false);

        let rendered = render_metrics().unwrap();
        assert!(rendered.contains(MATCHER_FALLBACK_TOTAL));
        assert!(rendered.contains("reason=\"no_mapping\""));
        assert!(rendered.contains("result=\"denied\""));
        assert!(get_metrics_handle().is_some());
    }
}
