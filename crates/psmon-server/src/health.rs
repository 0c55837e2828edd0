//! `/health` endpoint body.

use std::time::Instant;

use serde::Serialize;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is running.
    pub status: String,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Sessions currently streaming.
    pub active_sessions: usize,
    /// Registered workers not yet claimed by a connection.
    pub pending_workers: usize,
}

/// Build a health response from live counters.
#[must_use]
pub fn health_check(
    start_time: Instant,
    active_sessions: usize,
    pending_workers: usize,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        active_sessions,
        pending_workers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, 0);
        assert_eq!(resp.status, "ok");
    }

    #[test]
    fn uptime_starts_near_zero() {
        let resp = health_check(Instant::now(), 0, 0);
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        let resp = health_check(start, 0, 0);
        assert!(resp.uptime_secs >= 59);
    }

    #[test]
    fn counters_are_reported() {
        let resp = health_check(Instant::now(), 3, 7);
        assert_eq!(resp.active_sessions, 3);
        assert_eq!(resp.pending_workers, 7);
    }

    #[test]
    fn serialization_shape() {
        let resp = health_check(Instant::now(), 1, 2);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["active_sessions"], 1);
        assert_eq!(value["pending_workers"], 2);
        assert!(value["uptime_secs"].is_number());
    }
}
