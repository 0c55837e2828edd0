//! Collector error type.

use thiserror::Error;

/// Failure while producing a snapshot.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The blocking pool could not run the collection closure.
    #[error("blocking pool failure: {0}")]
    Pool(String),

    /// The collector could not produce a snapshot.
    #[error("snapshot collection failed: {0}")]
    Snapshot(String),

    /// The snapshot could not be serialized to a text frame.
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
