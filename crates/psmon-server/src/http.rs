//! HTTP endpoints: worker registration and one-shot snapshot fetches.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use psmon_core::{Worker, WorkerId};

use crate::metrics::WORKERS_REGISTERED_TOTAL;
use crate::server::AppState;

/// Body of the registration response.
///
/// `id` carries the minted worker token on success; `status` carries the
/// failure reason otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectResponse {
    /// Minted worker token, present on success.
    pub id: Option<WorkerId>,
    /// Failure reason, present on error.
    pub status: Option<String>,
}

/// `POST /connect` — mint and register a worker.
///
/// The token is single-use and short-lived: if no socket claims it within
/// the configured TTL the worker is recycled.
pub async fn register_worker(State(state): State<AppState>) -> Json<ConnectResponse> {
    let worker = Arc::new(Worker::new());
    let id = worker.id().clone();
    match state.registry.register(worker) {
        Ok(()) => {
            let ttl = Duration::from_secs(state.config.claim_ttl_secs);
            let _ = state.registry.expire_after(id.clone(), ttl);
            counter!(WORKERS_REGISTERED_TOTAL).increment(1);
            info!(worker_id = %id, "worker registered");
            Json(ConnectResponse {
                id: Some(id),
                status: None,
            })
        }
        Err(err) => {
            warn!(error = %err, "worker registration failed");
            Json(ConnectResponse {
                id: None,
                status: Some(err.to_string()),
            })
        }
    }
}

/// `GET /system` — one-shot host overview, collected on a pool slot.
pub async fn system_overview(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let host = Arc::clone(&state.host);
    let payload = state
        .pool
        .run(move || host.overview())
        .await
        .and_then(|inner| inner)
        .map_err(|err| {
            warn!(error = %err, "host overview failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(payload))
}

/// `GET /network` — one-shot interface overview.
pub async fn network_overview(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    state.net.overview().await.map(Json).map_err(|err| {
        warn!(error = %err, "network overview failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_shape() {
        let resp = ConnectResponse {
            id: Some(WorkerId::from("tok_1")),
            status: None,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["id"], "tok_1");
        assert!(value["status"].is_null());
    }

    #[test]
    fn failure_response_shape() {
        let resp = ConnectResponse {
            id: None,
            status: Some("worker id already registered: tok_1".into()),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value["id"].is_null());
        assert_eq!(value["status"], "worker id already registered: tok_1");
    }
}
