//! Metrics collection and Prometheus export.
//!
//! Installs the global recorder and wraps the session-specific series so call
//! sites do not repeat metric names.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once; later calls
/// reuse the first handle.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("A global metrics recorder was already installed");
        }
        handle
    })
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// One analysis request; `outcome` is `parsed`, `fallback` or `provider_error`.
pub fn record_analysis(model: &str, outcome: &'static str) {
    counter!(
        "analysis_requests_total",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_provider_latency(model: &str, elapsed: Duration) {
    histogram!("analysis_provider_latency_seconds", "model" => model.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_fallback(reason: &'static str) {
    counter!("analysis_fallbacks_total", "reason" => reason).increment(1);
}

/// A completion cut off by the output token limit.
pub fn record_truncation(model: &str) {
    counter!("analysis_truncated_total", "model" => model.to_string()).increment(1);
}

pub fn record_session_saved() {
    counter!("sessions_saved_total").increment(1);
}

pub fn record_store_error(operation: &'static str) {
    counter!("store_errors_total", "operation" => operation).increment(1);
}
