//! Worker — one pending or active monitoring session.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::WorkerError;
use crate::ids::{SessionId, WorkerId};

/// Lifecycle state of a [`Worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered, waiting for a connection to claim it.
    Pending,
    /// Claimed by exactly one session.
    Bound,
    /// Terminal: the session ended, or the worker was recycled unclaimed.
    Closed,
}

/// Handle to the session a worker is bound to.
///
/// Cancelling `closer` asks the session to close its socket; the push loop
/// observes the closed stream at its next write and exits.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// The bound session.
    pub session: SessionId,
    /// Close signal for the session's socket.
    pub closer: CancellationToken,
}

/// One pending or active monitoring session.
///
/// Created by the registration endpoint in `Pending` state, claimed by at
/// most one session, and closed exactly once — by session teardown, or by
/// the unclaimed-worker recycler if no connection ever arrives.
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    state: Mutex<WorkerState>,
    handle: Mutex<Option<SessionHandle>>,
}

impl Worker {
    /// Create a pending worker with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(WorkerId::new())
    }

    /// Create a pending worker under a caller-supplied token.
    #[must_use]
    pub fn with_id(id: WorkerId) -> Self {
        Self {
            id,
            state: Mutex::new(WorkerState::Pending),
            handle: Mutex::new(None),
        }
    }

    /// The worker's token.
    #[must_use]
    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Whether the worker has reached its terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == WorkerState::Closed
    }

    /// Bind the worker to a session.
    ///
    /// Set-once: a worker is bound to at most one session during its
    /// lifetime. Rebinding and binding a closed worker are rejected.
    pub fn bind(&self, handle: SessionHandle) -> Result<(), WorkerError> {
        let mut state = self.state.lock();
        match *state {
            WorkerState::Pending => {
                *state = WorkerState::Bound;
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            WorkerState::Bound => Err(WorkerError::AlreadyBound(self.id.clone())),
            WorkerState::Closed => Err(WorkerError::Closed(self.id.clone())),
        }
    }

    /// The bound session, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.handle.lock().as_ref().map(|h| h.session.clone())
    }

    /// Close the worker. Idempotent.
    ///
    /// If a session is bound, its close signal is cancelled so the socket
    /// shuts down; the push loop exits at its next write.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == WorkerState::Closed {
                return;
            }
            *state = WorkerState::Closed;
        }
        if let Some(handle) = self.handle.lock().as_ref() {
            handle.closer.cancel();
        }
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_handle() -> SessionHandle {
        SessionHandle {
            session: SessionId::new(),
            closer: CancellationToken::new(),
        }
    }

    #[test]
    fn new_worker_is_pending() {
        let worker = Worker::new();
        assert_eq!(worker.state(), WorkerState::Pending);
        assert!(!worker.is_closed());
        assert!(worker.session().is_none());
    }

    #[test]
    fn bind_transitions_to_bound() {
        let worker = Worker::new();
        let handle = make_handle();
        let session = handle.session.clone();
        worker.bind(handle).unwrap();
        assert_eq!(worker.state(), WorkerState::Bound);
        assert_eq!(worker.session(), Some(session));
    }

    #[test]
    fn rebind_is_rejected() {
        let worker = Worker::new();
        worker.bind(make_handle()).unwrap();
        let err = worker.bind(make_handle()).unwrap_err();
        assert!(matches!(err, WorkerError::AlreadyBound(_)));
        assert_eq!(worker.state(), WorkerState::Bound);
    }

    #[test]
    fn bind_after_close_is_rejected() {
        let worker = Worker::new();
        worker.close();
        let err = worker.bind(make_handle()).unwrap_err();
        assert!(matches!(err, WorkerError::Closed(_)));
    }

    #[test]
    fn close_cancels_bound_session() {
        let worker = Worker::new();
        let handle = make_handle();
        let closer = handle.closer.clone();
        worker.bind(handle).unwrap();
        assert!(!closer.is_cancelled());
        worker.close();
        assert!(closer.is_cancelled());
        assert!(worker.is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let worker = Worker::new();
        worker.bind(make_handle()).unwrap();
        worker.close();
        worker.close();
        worker.close();
        assert!(worker.is_closed());
    }

    #[test]
    fn close_without_bind() {
        let worker = Worker::new();
        worker.close();
        assert!(worker.is_closed());
        assert!(worker.session().is_none());
    }

    #[test]
    fn with_id_keeps_token() {
        let worker = Worker::with_id(WorkerId::from("abc"));
        assert_eq!(worker.id().as_str(), "abc");
    }
}
