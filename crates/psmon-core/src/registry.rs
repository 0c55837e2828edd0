//! Process-wide worker registry: token → pending worker, atomic handoff.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::RegistryError;
use crate::ids::WorkerId;
use crate::worker::Worker;

/// Token → pending [`Worker`] map.
///
/// Two actors mutate it: the registration endpoint inserts, connecting
/// sessions take. [`WorkerRegistry::take`] is an atomic remove-and-return,
/// so exactly one connection can claim a given token — a read-then-delete
/// pair would let two connections win the same worker.
///
/// Constructed once at service start and handed to whoever needs it; there
/// is no ambient global.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: DashMap<WorkerId, Arc<Worker>>,
}

impl WorkerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Register a pending worker under its token.
    ///
    /// Rejects duplicates: tokens are minted UUIDs, so a collision is a
    /// caller bug, and silently overwriting would orphan a pending worker
    /// without closing it.
    pub fn register(&self, worker: Arc<Worker>) -> Result<(), RegistryError> {
        match self.workers.entry(worker.id().clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateId(worker.id().clone())),
            Entry::Vacant(slot) => {
                let _ = slot.insert(worker);
                Ok(())
            }
        }
    }

    /// Atomically remove and return the worker for `id` — the handoff.
    ///
    /// # Errors
    /// [`RegistryError::HandoffNotFound`] when no pending worker holds `id`.
    pub fn take(&self, id: &WorkerId) -> Result<Arc<Worker>, RegistryError> {
        self.workers
            .remove(id)
            .map(|(_, worker)| worker)
            .ok_or_else(|| RegistryError::HandoffNotFound(id.clone()))
    }

    /// Number of pending (registered, unclaimed) workers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.workers.len()
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: &WorkerId) -> bool {
        self.workers.contains_key(id)
    }

    /// Recycle the worker for `id` after `ttl` if it is still unclaimed.
    ///
    /// A claimed worker has already left the map and is untouched. The
    /// recycled worker is closed so it can never be bound afterwards.
    pub fn expire_after(self: &Arc<Self>, id: WorkerId, ttl: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Ok(worker) = registry.take(&id) {
                worker.close();
                debug!(worker_id = %id, "recycled unclaimed worker");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerState;

    fn register_one(registry: &WorkerRegistry) -> Arc<Worker> {
        let worker = Arc::new(Worker::new());
        registry.register(Arc::clone(&worker)).unwrap();
        worker
    }

    #[test]
    fn register_and_take() {
        let registry = WorkerRegistry::new();
        let worker = register_one(&registry);
        assert_eq!(registry.pending(), 1);
        assert!(registry.contains(worker.id()));

        let taken = registry.take(worker.id()).unwrap();
        assert_eq!(taken.id(), worker.id());
        assert_eq!(registry.pending(), 0);
    }

    #[test]
    fn take_unknown_id_is_not_found() {
        let registry = WorkerRegistry::new();
        let err = registry.take(&WorkerId::from("ghost")).unwrap_err();
        assert!(matches!(err, RegistryError::HandoffNotFound(_)));
    }

    #[test]
    fn second_take_is_not_found() {
        let registry = WorkerRegistry::new();
        let worker = register_one(&registry);
        let _ = registry.take(worker.id()).unwrap();
        let err = registry.take(worker.id()).unwrap_err();
        assert!(matches!(err, RegistryError::HandoffNotFound(_)));
    }

    #[test]
    fn duplicate_register_is_rejected() {
        let registry = WorkerRegistry::new();
        let worker = register_one(&registry);
        let dup = Arc::new(Worker::with_id(worker.id().clone()));
        let err = registry.register(dup).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(_)));
        assert_eq!(registry.pending(), 1);
    }

    #[tokio::test]
    async fn concurrent_takes_have_one_winner() {
        let registry = Arc::new(WorkerRegistry::new());
        let worker = Arc::new(Worker::new());
        registry.register(Arc::clone(&worker)).unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let id = worker.id().clone();
            handles.push(tokio::spawn(async move { registry.take(&id).is_ok() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unclaimed_worker_expires() {
        let registry = Arc::new(WorkerRegistry::new());
        let worker = Arc::new(Worker::new());
        registry.register(Arc::clone(&worker)).unwrap();

        let timer = registry.expire_after(worker.id().clone(), Duration::from_secs(3));
        tokio::time::sleep(Duration::from_secs(4)).await;
        timer.await.unwrap();

        assert_eq!(registry.pending(), 0);
        assert_eq!(worker.state(), WorkerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn claimed_worker_is_not_expired() {
        let registry = Arc::new(WorkerRegistry::new());
        let worker = Arc::new(Worker::new());
        registry.register(Arc::clone(&worker)).unwrap();

        let timer = registry.expire_after(worker.id().clone(), Duration::from_secs(3));
        let claimed = registry.take(worker.id()).unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        timer.await.unwrap();

        assert_eq!(claimed.state(), WorkerState::Pending);
        assert!(!claimed.is_closed());
    }
}
