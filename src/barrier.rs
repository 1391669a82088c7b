//! Counting completion barrier
//!
//! A dynamically-registered set of concurrent units signal completion;
//! waiters block until the outstanding count returns to zero. The pipeline
//! uses one barrier per day (tasks of that day) and one global barrier
//! (aggregators of all days). Registration happens strictly before the
//! matching wait, so a barrier that never saw a registration releases its
//! waiter immediately — that is the zero-match-day case, not an error.

use tokio::sync::watch;

/// Barrier tracking an outstanding-unit count with async waiting
///
/// Clones share the same count. `register` and `complete` never block;
/// `wait_zero` suspends until every registered unit has completed.
#[derive(Clone, Debug)]
pub struct CompletionBarrier {
    count: watch::Sender<usize>,
}

impl CompletionBarrier {
    /// Create a barrier with no outstanding units
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// Register `n` more outstanding units
    pub fn register(&self, n: usize) {
        self.count.send_modify(|outstanding| *outstanding += n);
    }

    /// Signal that one registered unit has completed
    ///
    /// Completing more units than were registered is a bug in the caller and
    /// panics in debug builds.
    pub fn complete(&self) {
        self.count.send_modify(|outstanding| {
            debug_assert!(*outstanding > 0, "barrier completed more than registered");
            *outstanding = outstanding.saturating_sub(1);
        });
    }

    /// Current outstanding count
    pub fn outstanding(&self) -> usize {
        *self.count.borrow()
    }

    /// Wait until the outstanding count reaches zero
    pub async fn wait_zero(&self) {
        let mut rx = self.count.subscribe();
        // The sender half lives in self, so the channel cannot close while
        // we hold it; wait_for only errs on a dropped sender.
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_barrier_releases_immediately() {
        let barrier = CompletionBarrier::new();
        barrier.wait_zero().await;
    }

    #[tokio::test]
    async fn waiter_blocks_until_all_complete() {
        let barrier = CompletionBarrier::new();
        barrier.register(3);

        let waiter = {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.wait_zero().await })
        };

        for _ in 0..3 {
            assert!(!waiter.is_finished());
            barrier.complete();
            tokio::task::yield_now().await;
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn registrations_accumulate() {
        let barrier = CompletionBarrier::new();
        barrier.register(1);
        barrier.register(2);
        assert_eq!(barrier.outstanding(), 3);

        barrier.complete();
        barrier.complete();
        barrier.complete();
        assert_eq!(barrier.outstanding(), 0);
        barrier.wait_zero().await;
    }

    #[tokio::test]
    async fn many_units_completing_concurrently() {
        let barrier = CompletionBarrier::new();
        barrier.register(32);

        for _ in 0..32 {
            let barrier = barrier.clone();
            tokio::spawn(async move { barrier.complete() });
        }

        tokio::time::timeout(Duration::from_secs(1), barrier.wait_zero())
            .await
            .unwrap();
    }
}
