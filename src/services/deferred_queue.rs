//! Queue of rate-limited tasks and the single deferred retry pass over them.

use std::collections::{BTreeMap, VecDeque};
use tracing::{info, warn};

use super::cancellation::CancellationFlag;
use super::events::EventSink;
use super::executor::TaskExecutor;
use crate::domain::models::{DeferredEntry, DeferredReport, FetchTask, TaskResolution};

/// Outcome of draining the queue once.
#[derive(Debug, Clone, Default)]
pub struct DrainSummary {
    pub report: DeferredReport,
    pub recovered: usize,
    pub empty: usize,
    pub dropped: usize,
    /// A stop request interrupted the drain; undrained entries were discarded.
    pub cancelled: bool,
}

/// FIFO of rate-limited tasks, drained at most once per run.
#[derive(Debug, Default)]
pub struct DeferredRetryQueue {
    entries: VecDeque<DeferredEntry>,
}

impl DeferredRetryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: DeferredEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry counts per platform, for logging.
    pub fn platform_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.platform.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Re-execute every entry exactly once, in insertion order.
    ///
    /// Consumes the queue. Any non-success outcome, including another rate
    /// limit, drops the entry for good.
    pub async fn drain_once(
        self,
        executor: &dyn TaskExecutor,
        cancel: &CancellationFlag,
        events: &EventSink,
    ) -> DrainSummary {
        let mut summary = DrainSummary::default();

        for (platform, count) in self.platform_counts() {
            info!(platform, count, "deferred retry pass");
        }
        events
            .log(format!("Starting deferred retry pass over {} tasks.", self.len()))
            .await;

        for entry in self.entries {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let task = FetchTask::from(entry);
            let key = task.subject_key();
            match executor.execute(&task).await {
                TaskResolution::Succeeded { posts, .. } => {
                    info!(platform = %task.platform, subject = %key, posts = posts.len(), "deferred retry recovered");
                    events
                        .log(format!("Deferred retry saved {} posts for {task}.", posts.len()))
                        .await;
                    summary.report.record(key, posts);
                    summary.recovered += 1;
                }
                TaskResolution::NoContent => {
                    info!(platform = %task.platform, subject = %key, "deferred retry found no content");
                    summary.empty += 1;
                }
                TaskResolution::Cancelled => {
                    summary.cancelled = true;
                    break;
                }
                other => {
                    warn!(
                        platform = %task.platform,
                        subject = %key,
                        resolution = other.label(),
                        "deferred retry failed, dropping task"
                    );
                    events
                        .log(format!("Deferred retry for {task} failed ({}); dropped.", other.label()))
                        .await;
                    summary.dropped += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Post, Subject};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Resolves by platform: "good" succeeds, "empty" has nothing, anything else stays throttled.
    #[derive(Default)]
    struct RecordingExecutor {
        seen: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskExecutor for RecordingExecutor {
        async fn execute(&self, task: &FetchTask) -> TaskResolution {
            self.seen.lock().unwrap().push(task.external_id.clone());
            match task.platform.as_str() {
                "good" => TaskResolution::Succeeded {
                    posts: vec![Post::new("good", "", &task.external_id)],
                    attempts: 1,
                },
                "empty" => TaskResolution::NoContent,
                _ => TaskResolution::RateLimited("still throttled".into()),
            }
        }
    }

    fn entry(platform: &str, external_id: &str, subject: (&str, &str)) -> DeferredEntry {
        FetchTask::new(platform, external_id, Subject::new(subject.0, subject.1)).into()
    }

    #[tokio::test]
    async fn test_drain_processes_each_entry_once_in_order() {
        let mut queue = DeferredRetryQueue::new();
        queue.add(entry("good", "a", ("1", "X")));
        queue.add(entry("throttled", "b", ("2", "Y")));
        queue.add(entry("good", "c", ("1", "X")));
        queue.add(entry("empty", "d", ("3", "Z")));

        let executor = RecordingExecutor::default();
        let summary = queue
            .drain_once(&executor, &CancellationFlag::new(), &EventSink::disconnected())
            .await;

        assert_eq!(*executor.seen.lock().unwrap(), ["a", "b", "c", "d"]);
        assert_eq!(summary.recovered, 2);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.empty, 1);
        assert!(!summary.cancelled);

        let texts: Vec<_> = summary
            .report
            .get(&Subject::new("1", "X").key())
            .unwrap()
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(texts, ["a", "c"]);
        assert!(summary.report.get(&Subject::new("2", "Y").key()).is_none());
    }

    #[tokio::test]
    async fn test_drain_stops_when_cancelled() {
        let mut queue = DeferredRetryQueue::new();
        queue.add(entry("good", "a", ("1", "X")));

        let cancel = CancellationFlag::new();
        cancel.cancel();
        let executor = RecordingExecutor::default();
        let summary = queue
            .drain_once(&executor, &cancel, &EventSink::disconnected())
            .await;

        assert!(summary.cancelled);
        assert!(executor.seen.lock().unwrap().is_empty());
        assert!(summary.report.is_empty());
    }

    #[test]
    fn test_platform_counts() {
        let mut queue = DeferredRetryQueue::new();
        queue.add(entry("weibo", "a", ("1", "X")));
        queue.add(entry("qzone", "b", ("1", "X")));
        queue.add(entry("weibo", "c", ("2", "Y")));
        let counts = queue.platform_counts();
        assert_eq!(counts.get("weibo"), Some(&2));
        assert_eq!(counts.get("qzone"), Some(&1));
    }
}
