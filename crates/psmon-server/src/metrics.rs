//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Returns the handle used to render the `/metrics` endpoint. Must be called
/// once at startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render the Prometheus text exposition.
#[must_use]
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Sessions opened total (counter).
pub const SESSIONS_OPENED_TOTAL: &str = "monitor_sessions_opened_total";
/// Sessions closed total (counter).
pub const SESSIONS_CLOSED_TOTAL: &str = "monitor_sessions_closed_total";
/// Active sessions (gauge).
pub const SESSIONS_ACTIVE: &str = "monitor_sessions_active";
/// Workers registered total (counter).
pub const WORKERS_REGISTERED_TOTAL: &str = "monitor_workers_registered_total";
/// Handoff failures total (counter) — connects with an unknown token.
pub const HANDOFF_FAILURES_TOTAL: &str = "monitor_handoff_failures_total";
/// Snapshot frames pushed total (counter).
pub const FRAMES_SENT_TOTAL: &str = "monitor_frames_sent_total";
