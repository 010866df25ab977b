//! Fetch Orchestrator - drives a harvest run over a roster.
//!
//! The orchestrator is a thin coordinator over well-defined pieces:
//!
//! - **derivation**: roster subject -> fetch tasks, in declared platform order
//! - **types**: orchestrator configuration
//! - [`RetryController`]: per-task attempt loop and backoff
//! - [`DeferredRetryQueue`]: rate-limited tasks, drained once after a cooldown
//! - [`ResultAggregator`]: organization -> group -> subject result hierarchy
//!
//! A run executes on a single worker, one task at a time. The only state
//! shared with the outside is the [`CancellationFlag`] and the event channel.

pub mod derivation;
pub mod types;

pub use derivation::{derive_tasks, plan_entry};
pub use types::OrchestratorConfig;

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::cancellation::{CancellationFlag, WaitOutcome};
use super::deferred_queue::DeferredRetryQueue;
use super::events::{progress_percent, EventSink, RunEvent};
use super::executor::{PlatformExecutor, TaskExecutor};
use super::platform_registry::PlatformRegistry;
use super::result_aggregator::ResultAggregator;
use super::retry_controller::RetryController;
use crate::domain::errors::HarvestResult;
use crate::domain::models::{
    Config, DeferredReport, FetchTask, RosterEntry, RosterSource, RunReport, RunStats, RunStatus,
    SubjectKey, TaskResolution,
};
use crate::domain::ports::ResultStore;

/// How processing of one roster entry ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    Completed,
    /// The entry could not be read or validated; the run goes on.
    Failed,
    /// A stop request arrived while the entry was in progress.
    Interrupted,
}

/// Mutable state of one run, owned by the worker.
struct RunState {
    aggregator: ResultAggregator,
    queue: DeferredRetryQueue,
    stats: RunStats,
    seen: HashSet<(String, String, SubjectKey)>,
}

impl RunState {
    fn new() -> Self {
        Self {
            aggregator: ResultAggregator::new(),
            queue: DeferredRetryQueue::new(),
            stats: RunStats::default(),
            seen: HashSet::new(),
        }
    }
}

/// Harvests posts for every roster subject across the configured platforms.
pub struct FetchOrchestrator {
    config: OrchestratorConfig,
    registry: PlatformRegistry,
    controller: RetryController,
    store: Arc<dyn ResultStore>,
    cancel: CancellationFlag,
}

impl FetchOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        registry: PlatformRegistry,
        controller: RetryController,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            config,
            registry,
            controller,
            store,
            cancel: CancellationFlag::new(),
        }
    }

    /// Wire an orchestrator from the loaded configuration.
    pub fn from_config(config: &Config, registry: PlatformRegistry, store: Arc<dyn ResultStore>) -> Self {
        Self::new(
            OrchestratorConfig::from_config(config),
            registry,
            RetryController::from_config(config),
            store,
        )
    }

    /// Request a cooperative stop. Safe to call from any thread, any number of times.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("stop requested");
        }
        self.cancel.cancel();
    }

    /// Run on a dedicated tokio task, reporting through `events`.
    pub fn spawn(
        self: Arc<Self>,
        roster: Vec<RosterSource>,
        events: mpsc::Sender<RunEvent>,
    ) -> JoinHandle<HarvestResult<RunReport>> {
        tokio::spawn(async move { self.run(roster, EventSink::new(events)).await })
    }

    /// Process the whole roster, then the deferred pass, then persist.
    ///
    /// Single-task failures are resolved inside the run. Only a failure to
    /// prepare or persist output returns `Err`, after an `Errored` event.
    pub async fn run(&self, roster: Vec<RosterSource>, events: EventSink) -> HarvestResult<RunReport> {
        let run_id = Uuid::new_v4();
        self.run_inner(roster, events)
            .instrument(info_span!("harvest_run", %run_id))
            .await
    }

    async fn run_inner(&self, roster: Vec<RosterSource>, events: EventSink) -> HarvestResult<RunReport> {
        let run_dir = match self.store.prepare().await {
            Ok(dir) => dir,
            Err(err) => {
                error!(error = %err, "run setup failed");
                events.emit(RunEvent::Errored(err.to_string())).await;
                return Err(err);
            }
        };

        let executor = PlatformExecutor::new(
            self.registry.clone(),
            self.controller.clone(),
            self.cancel.clone(),
            events.clone(),
        );
        let total = roster.len();
        let mut state = RunState::new();
        let mut status = RunStatus::Finished;

        info!(entries = total, platforms = ?self.config.platforms, "harvest started");

        for (index, source) in roster.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                status = RunStatus::Stopped;
                break;
            }
            if self.process_entry(source, &executor, &mut state, &events).await == EntryOutcome::Interrupted {
                status = RunStatus::Stopped;
                break;
            }
            events.progress(progress_percent(index + 1, total)).await;
        }

        let mut deferred = DeferredReport::default();
        let queue = std::mem::take(&mut state.queue);
        if status == RunStatus::Finished && !queue.is_empty() {
            let (report, completed) = self
                .deferred_pass(queue, &executor, &mut state.stats, &events)
                .await;
            deferred = report;
            if !completed {
                status = RunStatus::Stopped;
            }
        } else if !queue.is_empty() {
            warn!(pending = queue.len(), "run stopped before the deferred retry pass");
        }

        let result = state.aggregator.into_run_result();
        if let Err(err) = self.store.persist(&run_dir, &result, &deferred).await {
            error!(error = %err, "failed to persist run output");
            events.emit(RunEvent::Errored(err.to_string())).await;
            return Err(err);
        }

        let stats = state.stats;
        info!(
            status = ?status,
            succeeded = stats.succeeded,
            no_content = stats.no_content,
            rate_limited = stats.rate_limited,
            given_up = stats.given_up,
            fatal = stats.fatal,
            deferred_recovered = stats.deferred_recovered,
            run_dir = %run_dir.display(),
            "harvest ended"
        );
        match status {
            RunStatus::Finished => {
                events.log(format!("All posts saved to {}", run_dir.display())).await;
                events.emit(RunEvent::Finished).await;
            }
            RunStatus::Stopped => {
                events.log("Harvest stopped; partial results saved.").await;
                events.emit(RunEvent::Stopped).await;
            }
        }

        Ok(RunReport {
            status,
            result,
            deferred,
            stats,
            run_dir,
        })
    }

    async fn process_entry(
        &self,
        source: RosterSource,
        executor: &PlatformExecutor,
        state: &mut RunState,
        events: &EventSink,
    ) -> EntryOutcome {
        let RosterSource { origin, entry } = source;
        let entry: RosterEntry = match entry.and_then(|e| e.validate(&origin).map(|()| e)) {
            Ok(entry) => entry,
            Err(err) => {
                state.stats.entries_failed += 1;
                error!(origin = %origin, error = %err, "skipping roster entry");
                events.log(format!("Error processing {origin}: {err}")).await;
                return EntryOutcome::Failed;
            }
        };

        info!(origin = %origin, org = %entry.group.org_id, group = %entry.group.group_key(), subjects = entry.subjects.len(), "processing roster entry");
        events.log(format!("Processing {origin}")).await;
        state.aggregator.register_group(&entry.group);

        for subject in &entry.subjects {
            if self.cancel.is_cancelled() {
                return EntryOutcome::Interrupted;
            }
            for task in derive_tasks(subject, &self.config.platforms) {
                let identity = (task.platform.clone(), task.external_id.clone(), task.subject_key());
                if !state.seen.insert(identity) {
                    warn!(task = %task, "duplicate task skipped");
                    continue;
                }
                if self.run_task(&entry, task, executor, state, events).await == EntryOutcome::Interrupted {
                    return EntryOutcome::Interrupted;
                }
            }
        }

        state.stats.entries_processed += 1;
        events
            .log(format!(
                "Finished {origin}: org {} group {}",
                entry.group.org_id,
                entry.group.group_key()
            ))
            .await;
        EntryOutcome::Completed
    }

    async fn run_task(
        &self,
        entry: &RosterEntry,
        task: FetchTask,
        executor: &PlatformExecutor,
        state: &mut RunState,
        events: &EventSink,
    ) -> EntryOutcome {
        state.stats.tasks_started += 1;
        info!(platform = %task.platform, subject = %task.subject_key(), external_id = %task.external_id, "task started");
        events.log(format!("Fetching {task}")).await;

        match executor.execute(&task).await {
            TaskResolution::Succeeded { posts, attempts } => {
                state.stats.succeeded += 1;
                info!(platform = %task.platform, subject = %task.subject_key(), posts = posts.len(), attempts, "task succeeded");
                events
                    .log(format!("Saved {} {} posts for {}", posts.len(), task.platform, task.subject.name))
                    .await;
                state.aggregator.record(&entry.group, &task.subject, posts);
            }
            TaskResolution::NoContent => {
                state.stats.no_content += 1;
                info!(platform = %task.platform, subject = %task.subject_key(), "no content, skipping");
                events.log(format!("No posts for {task}; skipped.")).await;
            }
            TaskResolution::RateLimited(message) => {
                state.stats.rate_limited += 1;
                warn!(platform = %task.platform, subject = %task.subject_key(), error = %message, "rate limited, deferring task");
                events
                    .log(format!("Rate limited while fetching {task}: {message}. Deferred to the retry pass."))
                    .await;
                state.queue.add(task.into());
            }
            TaskResolution::GivenUp { attempts, last_error } => {
                state.stats.given_up += 1;
                error!(platform = %task.platform, subject = %task.subject_key(), attempts, error = %last_error, "giving up on task");
                events
                    .log(format!("Fetching {task} failed: {last_error}. Reached the maximum of {attempts} attempts."))
                    .await;
            }
            TaskResolution::Fatal(message) => {
                state.stats.fatal += 1;
                error!(platform = %task.platform, subject = %task.subject_key(), error = %message, "task failed permanently");
                events.log(format!("Fetching {task} failed permanently: {message}")).await;
            }
            TaskResolution::Cancelled => return EntryOutcome::Interrupted,
        }
        EntryOutcome::Completed
    }

    /// Cooldown then one drain. The flag is false when a stop request cut it
    /// short; whatever was recovered before that is still returned.
    async fn deferred_pass(
        &self,
        queue: DeferredRetryQueue,
        executor: &dyn TaskExecutor,
        stats: &mut RunStats,
        events: &EventSink,
    ) -> (DeferredReport, bool) {
        info!(pending = queue.len(), cooldown_secs = self.config.cooldown.as_secs(), "waiting before deferred retry pass");
        events
            .log(format!(
                "{} rate-limited tasks deferred; retrying in {:.0} minutes.",
                queue.len(),
                self.config.cooldown.as_secs_f64() / 60.0
            ))
            .await;
        events
            .emit(RunEvent::CooldownStarted {
                pending: queue.len(),
                wait: self.config.cooldown,
            })
            .await;

        let waited = self.cancel.wait(self.config.cooldown, self.config.poll_interval).await;
        events.emit(RunEvent::CooldownEnded).await;
        if waited == WaitOutcome::Cancelled {
            warn!(pending = queue.len(), "stopped during cooldown, deferred tasks dropped");
            return (DeferredReport::default(), false);
        }

        let summary = queue.drain_once(executor, &self.cancel, events).await;
        stats.deferred_recovered += summary.recovered;
        stats.deferred_dropped += summary.dropped;
        (summary.report, !summary.cancelled)
    }
}
