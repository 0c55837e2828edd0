//! # psmon-server
//!
//! Axum HTTP + WebSocket server for the telemetry stream.
//!
//! - HTTP: worker registration (`POST /connect`), one-shot snapshots
//!   (`GET /system`, `GET /network`), health check, Prometheus metrics
//! - WebSocket: single-use token handoff on `GET /connect?id=…`, then a
//!   per-session push loop until the peer goes away
//! - Low-latency listener: `TCP_NODELAY` on every accepted socket
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod http;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;
