//! Bounded pool of execution slots for blocking collector calls.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::CollectError;

/// Execution slots available service-wide by default.
pub const DEFAULT_SLOTS: usize = 16;

/// Fixed-size pool of execution slots for blocking calls.
///
/// Submission acquires a slot first; while all slots are busy the submitting
/// task suspends until one frees. A slow collector therefore backs pressure
/// up to its callers instead of queueing work unboundedly — submission never
/// errors and never drops.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl BlockingPool {
    /// Create a pool with `slots` execution slots.
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(slots)),
            capacity: slots,
        }
    }

    /// Run a blocking closure on a pool slot.
    ///
    /// Suspends while the pool is saturated and while the closure runs; the
    /// scheduler thread is never blocked.
    ///
    /// # Errors
    /// [`CollectError::Pool`] if the closure panicked.
    pub async fn run<T, F>(&self, f: F) -> Result<T, CollectError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|e| CollectError::Pool(e.to_string()))?;
        let result = tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| CollectError::Pool(e.to_string()));
        drop(permit);
        result
    }

    /// Slots not currently in use.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BlockingPool {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn runs_closure_and_returns_value() {
        let pool = BlockingPool::new(2);
        let value = pool.run(|| 21 * 2).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn panicking_closure_surfaces_as_pool_error() {
        let pool = BlockingPool::new(1);
        let result: Result<(), _> = pool.run(|| panic!("collector exploded")).await;
        assert!(matches!(result, Err(CollectError::Pool(_))));
        // The slot is released even after a panic.
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn default_capacity_is_sixteen() {
        let pool = BlockingPool::default();
        assert_eq!(pool.capacity(), DEFAULT_SLOTS);
        assert_eq!(pool.available(), 16);
    }

    #[tokio::test]
    async fn saturated_pool_suspends_submission_until_a_slot_frees() {
        let pool = BlockingPool::new(2);

        // Park two closures so every slot is busy.
        let (release_a, parked_a) = std::sync::mpsc::channel::<()>();
        let (release_b, parked_b) = std::sync::mpsc::channel::<()>();
        let pool_a = pool.clone();
        let task_a = tokio::spawn(async move { pool_a.run(move || parked_a.recv().unwrap()).await });
        let pool_b = pool.clone();
        let task_b = tokio::spawn(async move { pool_b.run(move || parked_b.recv().unwrap()).await });

        while pool.available() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // A third submission must suspend, not error.
        let pool_c = pool.clone();
        let task_c = tokio::spawn(async move { pool_c.run(|| 7).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task_c.is_finished());

        // Freeing one slot lets the suspended submission proceed.
        release_a.send(()).unwrap();
        let value = tokio::time::timeout(Duration::from_secs(5), task_c)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(value, 7);

        release_b.send(()).unwrap();
        task_a.await.unwrap().unwrap();
        task_b.await.unwrap().unwrap();
    }
}
