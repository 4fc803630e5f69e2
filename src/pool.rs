//! Worker pool running per-connection work.
//!
//! Dispatch policy is one task per connection: `submit` spawns onto the
//! runtime and returns immediately, so the accept loop never waits on a
//! slow handler. The runtime grows and parks worker threads as load
//! changes; the pool itself keeps no queue and imposes no cap, which
//! leaves flood protection to the deployment.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Fire-and-forget executor for connection work.
///
/// Cheap to clone; clones share the same counters.
#[derive(Clone, Default)]
pub struct WorkerPool {
    active: Arc<AtomicUsize>,
    dispatched: Arc<AtomicU64>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one unit of connection work. Returns immediately.
    ///
    /// The work owns its failure handling; nothing is reported back to
    /// the submitter.
    pub fn submit<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(Arc::clone(&self.active));
        tokio::spawn(async move {
            let _guard = guard;
            work.await;
        });
    }

    /// Number of handlers currently executing.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Total units of work ever submitted.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

/// Decrements the active gauge when the task finishes, panics included.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn drained(pool: &WorkerPool) -> bool {
        for _ in 0..100 {
            if pool.active() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn submit_returns_before_the_work_completes() {
        let pool = WorkerPool::new();
        let (tx, rx) = oneshot::channel::<()>();

        pool.submit(async move {
            let _ = rx.await;
        });
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.dispatched(), 1);

        tx.send(()).unwrap();
        assert!(drained(&pool).await);
    }

    #[tokio::test]
    async fn panicking_work_releases_its_slot() {
        let pool = WorkerPool::new();
        pool.submit(async {
            panic!("handler bug");
        });
        assert!(drained(&pool).await);
        assert_eq!(pool.dispatched(), 1);
    }
}
