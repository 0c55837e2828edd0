//! `MonitorServer` — axum HTTP + WebSocket server and the low-latency
//! listener.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::serve::Listener;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use psmon_collect::{BlockingPool, HostSource, NetworkSource};
use psmon_core::{WorkerId, WorkerRegistry};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::http;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::push::PushLoop;
use crate::websocket::session;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Pending-worker registry.
    pub registry: Arc<WorkerRegistry>,
    /// Host snapshot producer.
    pub host: Arc<dyn HostSource>,
    /// Network snapshot producer.
    pub net: Arc<dyn NetworkSource>,
    /// Execution slots for blocking collection.
    pub pool: BlockingPool,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Live session counter.
    pub sessions: Arc<AtomicUsize>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle.
    pub metrics: PrometheusHandle,
}

/// The monitor server.
pub struct MonitorServer {
    state: AppState,
}

impl MonitorServer {
    /// Create a server from its wired dependencies.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        registry: Arc<WorkerRegistry>,
        host: Arc<dyn HostSource>,
        net: Arc<dyn NetworkSource>,
        metrics: PrometheusHandle,
    ) -> Self {
        let pool = BlockingPool::new(config.pool_slots);
        let state = AppState {
            config: Arc::new(config),
            registry,
            host,
            net,
            pool,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            sessions: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
            metrics,
        };
        Self { state }
    }

    /// Build the router with all routes.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/connect", get(ws_upgrade).post(http::register_worker))
            .route("/system", get(http::system_overview))
            .route("/network", get(http::network_overview))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve. Returns the bound address and the serve task.
    ///
    /// Every accepted socket gets `TCP_NODELAY`, so snapshot frames leave
    /// without coalescing delay.
    pub async fn listen(&self) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.router();
        let token = self.state.shutdown.token();
        let serve_task = tokio::spawn(async move {
            let serve = axum::serve(NodelayListener::new(listener), router)
                .with_graceful_shutdown(token.cancelled_owned());
            if let Err(err) = serve.await {
                warn!(error = %err, "serve task exited with error");
            }
        });
        info!(addr = %local_addr, "monitor server listening");
        Ok((local_addr, serve_task))
    }

    /// Shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Shared state, for embedding and tests.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// TCP listener that sets `TCP_NODELAY` on every accepted socket.
///
/// Snapshot frames are small and latency-sensitive; leaving Nagle's
/// algorithm on would batch them.
pub struct NodelayListener {
    inner: TcpListener,
}

impl NodelayListener {
    /// Wrap a bound listener.
    #[must_use]
    pub fn new(inner: TcpListener) -> Self {
        Self { inner }
    }
}

impl Listener for NodelayListener {
    type Io = TcpStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.inner.accept().await {
                Ok((stream, addr)) => {
                    if let Err(err) = stream.set_nodelay(true) {
                        warn!(error = %err, "failed to set TCP_NODELAY");
                    }
                    return (stream, addr);
                }
                Err(err) => warn!(error = %err, "accept failed"),
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

/// Query parameters of the upgrade endpoint.
#[derive(Debug, Deserialize)]
struct UpgradeParams {
    id: Option<String>,
}

/// `GET /connect?id=<token>` — the WebSocket upgrade.
///
/// A missing or empty token rejects the upgrade outright, before any socket
/// exists. An unknown token is reported on the socket after the upgrade so
/// the client sees the reason.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<UpgradeParams>,
    State(state): State<AppState>,
) -> Response {
    let Some(id) = params.id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing worker id").into_response();
    };
    let id = WorkerId::from(id);
    let variant = PushLoop::host(Arc::clone(&state.host), state.pool.clone());
    ws.on_upgrade(move |socket| session::handle_socket(socket, id, variant, state))
        .into_response()
}

/// `GET /health`.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.sessions.load(Ordering::Relaxed),
        state.registry.pending(),
    );
    Json(resp)
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}
