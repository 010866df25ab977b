//! Run events delivered from the worker to whoever drives the run.

use std::time::Duration;
use tokio::sync::mpsc;

/// Notification emitted by a running harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Percentage of roster entries processed, non-decreasing.
    Progress(u8),
    /// Human-readable state transition.
    Log(String),
    /// The deferred pass is waiting out its cooldown.
    CooldownStarted { pending: usize, wait: Duration },
    /// The cooldown wait ended, elapsed or cancelled.
    CooldownEnded,
    /// All entries and the deferred pass completed.
    Finished,
    /// A stop request ended the run early.
    Stopped,
    /// Setup or persistence failed and the run was aborted.
    Errored(String),
}

/// Sending half of the event channel.
///
/// A closed or absent receiver is ignored; the run never depends on
/// anybody listening.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<RunEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every event.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    pub async fn log(&self, line: impl Into<String>) {
        self.emit(RunEvent::Log(line.into())).await;
    }

    pub async fn progress(&self, percent: u8) {
        self.emit(RunEvent::Progress(percent)).await;
    }
}

/// Progress after `processed` of `total` entries: `floor(processed * 100 / total)`.
///
/// Callers pass the 1-based count of the entry just completed.
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = processed.min(total) * 100 / total;
    u8::try_from(percent).unwrap_or(100)
}
