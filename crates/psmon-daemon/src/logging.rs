//! Tracing initialization.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "psmon=info,psmon_core=info,psmon_collect=info,psmon_server=info,tower_http=warn";

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; `json` switches to newline-delimited JSON output for
/// log shippers.
pub fn init(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
