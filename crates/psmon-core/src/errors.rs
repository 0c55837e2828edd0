//! Error types for worker registration and handoff.

use thiserror::Error;

use crate::ids::WorkerId;

/// Registry-level failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A worker with this id is already registered.
    #[error("worker id already registered: {0}")]
    DuplicateId(WorkerId),

    /// No pending worker exists for this id at handoff time. A second
    /// handoff attempt with an already-claimed token always lands here.
    #[error("no pending worker for id: {0}")]
    HandoffNotFound(WorkerId),
}

/// Worker lifecycle violations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker is already bound to a session; rebinding is rejected.
    #[error("worker {0} is already bound to a session")]
    AlreadyBound(WorkerId),

    /// The worker has reached its terminal state.
    #[error("worker {0} is closed")]
    Closed(WorkerId),
}
