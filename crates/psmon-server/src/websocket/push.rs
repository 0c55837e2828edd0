//! Push loops — the per-session fetch→write cycle, in two variants.

use std::sync::Arc;

use axum::extract::ws::Message;
use metrics::counter;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use psmon_collect::{BlockingPool, CollectError, HostSource, NetworkSource};

use crate::metrics::FRAMES_SENT_TOTAL;

/// One per-session push loop, selected when the session is constructed.
///
/// Both variants share one contract: fetch a snapshot, write it as a text
/// frame, repeat until a terminal condition. A failed write means the socket
/// (or the session's outbound queue behind it) is gone — that is the expected
/// shutdown path and is reported as `Ok`. A collection failure propagates to
/// the session, which closes the socket.
pub enum PushLoop {
    /// Host metrics: blocking collector submitted to the execution pool.
    Host {
        /// Snapshot producer.
        source: Arc<dyn HostSource>,
        /// Execution slots for the blocking call.
        pool: BlockingPool,
    },
    /// Network metrics: suspending collector invoked directly.
    Network {
        /// Snapshot producer.
        source: Arc<dyn NetworkSource>,
    },
}

impl PushLoop {
    /// Host-metrics variant.
    #[must_use]
    pub fn host(source: Arc<dyn HostSource>, pool: BlockingPool) -> Self {
        Self::Host { source, pool }
    }

    /// Network-metrics variant.
    #[must_use]
    pub fn network(source: Arc<dyn NetworkSource>) -> Self {
        Self::Network { source }
    }

    /// Drive the loop until a terminal condition.
    ///
    /// # Errors
    /// [`CollectError`] when the collector or serializer fails.
    pub async fn run(self, frames: mpsc::Sender<Message>) -> Result<(), CollectError> {
        match self {
            Self::Host { source, pool } => host_loop(source, pool, frames).await,
            Self::Network { source } => network_loop(source, frames).await,
        }
    }
}

/// Fetch through the pool; skip empty payloads. The pace comes entirely from
/// the collector's own sampling latency and from pool backpressure — there is
/// no sleep here.
async fn host_loop(
    source: Arc<dyn HostSource>,
    pool: BlockingPool,
    frames: mpsc::Sender<Message>,
) -> Result<(), CollectError> {
    loop {
        let collector = Arc::clone(&source);
        let payload = pool.run(move || collector.sample()).await??;
        if is_empty_payload(&payload) {
            continue;
        }
        if send_frame(&frames, &payload).await.is_err() {
            return Ok(());
        }
    }
}

/// Fetch directly on the scheduler; every payload is written.
async fn network_loop(
    source: Arc<dyn NetworkSource>,
    frames: mpsc::Sender<Message>,
) -> Result<(), CollectError> {
    loop {
        let payload = source.sample().await?;
        if send_frame(&frames, &payload).await.is_err() {
            return Ok(());
        }
    }
}

/// Serialize and enqueue one text frame; suspends while the queue is full.
async fn send_frame(
    frames: &mpsc::Sender<Message>,
    payload: &Value,
) -> Result<(), mpsc::error::SendError<Message>> {
    let text = payload.to_string();
    trace!(bytes = text.len(), "pushing snapshot frame");
    frames.send(Message::Text(text.into())).await?;
    counter!(FRAMES_SENT_TOTAL).increment(1);
    Ok(())
}

/// A payload with nothing in it is skipped by the host loop: an empty result
/// from the collector means "nothing new yet", not a frame worth sending.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
