//! Cooperative cancellation shared between the run worker and its controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const MIN_POLL: Duration = Duration::from_millis(1);
const MAX_POLL: Duration = Duration::from_secs(1);

/// Stop flag polled by the worker at its loop boundaries and during waits.
///
/// Cloning shares the flag. Setting it is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    stopped: Arc<AtomicBool>,
}

/// How an interruptible wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, checking the flag at least every `poll`.
    ///
    /// `poll` is clamped to 1 ms..=1 s. A duration too large to represent as
    /// a deadline only ends on cancellation.
    pub async fn wait(&self, duration: Duration, poll: Duration) -> WaitOutcome {
        let poll = poll.clamp(MIN_POLL, MAX_POLL);
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let step = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::Elapsed;
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };
            sleep(step).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_elapses() {
        let flag = CancellationFlag::new();
        let outcome = flag
            .wait(Duration::from_millis(20), Duration::from_millis(5))
            .await;
        assert_eq!(outcome, WaitOutcome::Elapsed);
    }

    #[tokio::test]
    async fn test_wait_returns_promptly_on_cancel() {
        let flag = CancellationFlag::new();
        let remote = flag.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            remote.cancel();
        });

        let started = std::time::Instant::now();
        let outcome = flag
            .wait(Duration::from_secs(60), Duration::from_millis(10))
            .await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_wait_with_unrepresentable_deadline_ends_on_cancel() {
        let flag = CancellationFlag::new();
        let remote = flag.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            remote.cancel();
        });

        let outcome = flag
            .wait(Duration::from_secs(u64::MAX), Duration::from_millis(5))
            .await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_coarse_poll_still_observes_stop_within_a_second() {
        let flag = CancellationFlag::new();
        let remote = flag.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            remote.cancel();
        });

        let started = std::time::Instant::now();
        let outcome = flag
            .wait(Duration::from_secs(60), Duration::from_secs(3))
            .await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_millis(1500), "{:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let flag = CancellationFlag::new();
        flag.cancel();
        flag.cancel();
        assert!(flag.is_cancelled());
        assert_eq!(
            flag.wait(Duration::from_secs(5), Duration::from_secs(1)).await,
            WaitOutcome::Cancelled
        );
    }
}
