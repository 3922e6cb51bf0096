//! Periodic cleanup of expired in-process state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// State that accumulates expired entries and can drop them on demand.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove expired entries, returning how many were dropped.
    fn sweep(&self) -> usize;
}

/// Run `target.sweep()` every `interval` until shutdown fires.
pub fn spawn_sweeper(
    target: Arc<dyn Sweep>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = target.sweep();
                    if removed > 0 {
                        tracing::debug!(target_name = target.name(), removed, "Swept expired entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!(target_name = target.name(), "Sweeper stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Sweep for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn sweep(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test]
    async fn test_sweeper_runs_until_shutdown() {
        let target = Arc::new(Counting::default());
        let shutdown = Shutdown::new();
        let handle = spawn_sweeper(target.clone(), Duration::from_millis(10), shutdown.subscribe());

        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();
        handle.await.unwrap();

        let runs = target.0.load(Ordering::SeqCst);
        assert!(runs >= 2, "ran {runs} times");
    }
}
