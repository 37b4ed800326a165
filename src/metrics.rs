//! Registry metrics
//!
//! Counters and a latency histogram per facade operation, plus a rollback
//! counter for compensated writes. Recording is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const OPERATIONS_TOTAL: &str = "spec_registry_operations_total";
pub const FAILURES_TOTAL: &str = "spec_registry_failures_total";
pub const ROLLBACKS_TOTAL: &str = "spec_registry_rollbacks_total";
pub const OPERATION_DURATION: &str = "spec_registry_operation_duration_seconds";

/// Install the global Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_ok() {
                describe_all();
                info!("Prometheus recorder installed");
            }
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Prometheus exposition text, or an empty string before [`init_metrics`].
pub fn render() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}

fn describe_all() {
    ::metrics::describe_counter!(OPERATIONS_TOTAL, "Facade operations by outcome");
    ::metrics::describe_counter!(FAILURES_TOTAL, "Failed facade operations by error name");
    ::metrics::describe_counter!(ROLLBACKS_TOTAL, "Compensated blob writes");
    ::metrics::describe_histogram!(OPERATION_DURATION, "Facade operation latency in seconds");
}

pub struct RegistryMetrics;

impl RegistryMetrics {
    pub fn record_success(operation: &'static str, duration_secs: f64) {
        ::metrics::counter!(OPERATIONS_TOTAL, "operation" => operation, "outcome" => "success")
            .increment(1);
        ::metrics::histogram!(OPERATION_DURATION, "operation" => operation).record(duration_secs);
    }

    pub fn record_failure(operation: &'static str, error: &str, duration_secs: f64) {
        ::metrics::counter!(OPERATIONS_TOTAL, "operation" => operation, "outcome" => "failure")
            .increment(1);
        ::metrics::counter!(FAILURES_TOTAL, "operation" => operation, "error" => error.to_string())
            .increment(1);
        ::metrics::histogram!(OPERATION_DURATION, "operation" => operation).record(duration_secs);
    }

    pub fn record_rollback(kind: &'static str) {
        ::metrics::counter!(ROLLBACKS_TOTAL, "kind" => kind).increment(1);
    }
}
