//! WebSocket session lifecycle — one connected client from token handoff
//! through disconnect.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use psmon_core::{SessionHandle, SessionId, Worker, WorkerId};

use super::push::PushLoop;
use crate::metrics::{
    HANDOFF_FAILURES_TOTAL, SESSIONS_ACTIVE, SESSIONS_CLOSED_TOTAL, SESSIONS_OPENED_TOTAL,
};
use crate::server::AppState;

/// First frame after a successful handoff, verbatim.
pub const ACK_FRAME: &str = "connected to monitor, transmitting data...";

/// Close reason sent when the token has no pending worker.
pub const INVALID_ID_REASON: &str = "invalid worker id";

/// Resolve the token and run the session, or close the socket with a reason.
///
/// The handoff happens after the upgrade so the client sees why it was
/// turned away; a missing token never gets this far (the upgrade itself is
/// rejected).
pub async fn handle_socket(socket: WebSocket, id: WorkerId, variant: PushLoop, state: AppState) {
    match state.registry.take(&id) {
        Ok(worker) => run_ws_session(socket, worker, variant, state).await,
        Err(err) => {
            counter!(HANDOFF_FAILURES_TOTAL).increment(1);
            info!(worker_id = %id, error = %err, "rejected connection");
            close_with_reason(socket, INVALID_ID_REASON).await;
        }
    }
}

/// Run one monitoring session.
///
/// 1. Binds the worker to this session (set-once; a rebind closes the socket)
/// 2. Sends the verbatim ack frame
/// 3. Spawns the outbound forwarder and the push loop — the loop starts on
///    the next scheduler turn, never inline, so the upgrade handshake settles
/// 4. Echoes every inbound text frame
/// 5. Closes the worker on exit, whatever the exit path
pub async fn run_ws_session(
    socket: WebSocket,
    worker: Arc<Worker>,
    variant: PushLoop,
    state: AppState,
) {
    let session_id = SessionId::new();
    let closer = CancellationToken::new();

    let handle = SessionHandle {
        session: session_id.clone(),
        closer: closer.clone(),
    };
    if let Err(err) = worker.bind(handle) {
        warn!(worker_id = %worker.id(), error = %err, "bind rejected");
        close_with_reason(socket, "worker unavailable").await;
        return;
    }

    // From here on every exit path must close the worker.
    let _guard = WorkerGuard::new(Arc::downgrade(&worker));

    info!(session_id = %session_id, worker_id = %worker.id(), "client connected");
    counter!(SESSIONS_OPENED_TOTAL).increment(1);
    gauge!(SESSIONS_ACTIVE).increment(1.0);
    let _ = state.sessions.fetch_add(1, Ordering::Relaxed);

    let (mut ws_tx, mut ws_rx) = socket.split();

    if ws_tx.send(Message::Text(ACK_FRAME.into())).await.is_err() {
        // Peer vanished between upgrade and ack.
        finish_session(&state, &session_id);
        return;
    }

    let (frame_tx, mut frame_rx) = mpsc::channel::<Message>(state.config.send_queue);

    // Outbound forwarder: sole owner of the sink. Exits when the peer goes
    // away, when every producer hangs up, or when the worker is closed — in
    // the last case it says goodbye with a close frame first.
    let forward_closer = closer.clone();
    let _forwarder = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = frame_rx.recv() => match frame {
                    Some(frame) => {
                        if ws_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                () = forward_closer.cancelled() => {
                    let close = Message::Close(Some(CloseFrame {
                        code: close_code::NORMAL,
                        reason: "monitor closed".into(),
                    }));
                    let _ = ws_tx.send(close).await;
                    break;
                }
            }
        }
    });

    // The push loop. Whatever ends it — peer gone, worker closed, collector
    // failure — the session's socket closes with it, one write late.
    let push_closer = closer.clone();
    let push_frames = frame_tx.clone();
    let _push = tokio::spawn(async move {
        if let Err(err) = variant.run(push_frames).await {
            warn!(error = %err, "push loop terminated by collection failure");
        }
        push_closer.cancel();
    });

    // Inbound loop: the channel is push-only, so every text frame just gets
    // an acknowledgement echo to prove liveness.
    loop {
        tokio::select! {
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let reply = Message::Text(format!("message received {text}").into());
                    if frame_tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(session_id = %session_id, error = %err, "socket error");
                    break;
                }
            },
            () = closer.cancelled() => break,
        }
    }

    // Wake the forwarder so it can say goodbye and release the sink; the
    // push loop then exits at its next write.
    closer.cancel();
    drop(frame_tx);

    info!(session_id = %session_id, worker_id = %worker.id(), "client disconnected");
    finish_session(&state, &session_id);
}

fn finish_session(state: &AppState, session_id: &SessionId) {
    counter!(SESSIONS_CLOSED_TOTAL).increment(1);
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
    let _ = state.sessions.fetch_sub(1, Ordering::Relaxed);
    debug!(session_id = %session_id, "session finished");
}

async fn close_with_reason(mut socket: WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: reason.into(),
    };
    if let Err(err) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %err, "close frame not delivered");
    }
}

/// Closes the session's worker when dropped — the teardown that must run
/// exactly once on every exit path.
///
/// Holds only a weak reference: if the worker was already closed and dropped
/// by another path, teardown observes nothing to do, and the guard can never
/// keep the worker alive past its session.
struct WorkerGuard {
    worker: Weak<Worker>,
}

impl WorkerGuard {
    fn new(worker: Weak<Worker>) -> Self {
        Self { worker }
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.upgrade() {
            worker.close();
        }
    }
}
