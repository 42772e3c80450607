//! Bounded background execution for access-log writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;

/// Runs log writes off the request path, with a cap on how many may be in
/// flight at once.
///
/// Past the cap a record is dropped and counted rather than queued, so a slow
/// sink cannot grow memory without bound. Clones share the cap and counter.
#[derive(Clone, Debug)]
pub struct BackgroundLogger {
    permits: Arc<Semaphore>,
    capacity: u32,
    dropped: Arc<AtomicU64>,
}

impl BackgroundLogger {
    /// `capacity` is clamped to at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = u32::try_from(capacity.clamp(1, Semaphore::MAX_PERMITS)).unwrap_or(u32::MAX);
        Self {
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedules `job` on the blocking pool. Returns `false` if it was dropped.
    ///
    /// Outside a Tokio runtime the job runs inline.
    pub fn spawn<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            job();
            return true;
        };

        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                handle.spawn_blocking(move || {
                    job();
                    drop(permit);
                });
                true
            }
            Err(_) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(dropped_total = total, "log queue full, dropping access record");
                false
            }
        }
    }

    /// Records dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        self.capacity as usize - self.permits.available_permits()
    }

    /// Waits until every scheduled write has finished.
    ///
    /// Meant for quiescent points such as tests and shutdown. While it waits
    /// it holds every permit it has collected, so records scheduled in the
    /// meantime are dropped and counted.
    pub async fn drain(&self) {
        if let Ok(all) = self.permits.acquire_many(self.capacity).await {
            drop(all);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test]
    async fn drops_past_capacity_and_recovers() {
        let logger = BackgroundLogger::new(1);
        let (release, wait) = mpsc::channel::<()>();

        assert!(logger.spawn(move || {
            let _ = wait.recv();
        }));
        assert_eq!(logger.pending(), 1);
        assert!(!logger.spawn(|| {}));
        assert_eq!(logger.dropped(), 1);

        release.send(()).unwrap();
        logger.drain().await;
        assert_eq!(logger.pending(), 0);

        let (done, seen) = mpsc::channel();
        assert!(logger.spawn(move || done.send(()).unwrap()));
        logger.drain().await;
        assert!(seen.try_recv().is_ok());
        assert_eq!(logger.dropped(), 1);
    }

    #[tokio::test]
    async fn records_scheduled_during_drain_are_dropped() {
        let logger = BackgroundLogger::new(2);
        let (release, wait) = mpsc::channel::<()>();
        assert!(logger.spawn(move || {
            let _ = wait.recv();
        }));

        let draining = tokio::spawn({
            let logger = logger.clone();
            async move { logger.drain().await }
        });
        // Let the drain task take the free permit and start waiting.
        tokio::task::yield_now().await;

        assert!(!logger.spawn(|| {}));
        assert_eq!(logger.dropped(), 1);

        release.send(()).unwrap();
        draining.await.unwrap();
        assert!(logger.spawn(|| {}));
    }

    #[test]
    fn runs_inline_without_runtime() {
        let logger = BackgroundLogger::new(0);
        let (done, seen) = mpsc::channel();
        assert!(logger.spawn(move || done.send(()).unwrap()));
        assert!(seen.try_recv().is_ok());
    }
}
