//! Common test utilities for integration tests
//!
//! Scripted platform clients, roster builders and a fast run configuration.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

use pulse::domain::models::{BackoffWindow, GroupInfo, Post, RosterEntry, RosterSource, Subject};
use pulse::services::{OrchestratorConfig, RetryController, RunEvent};
use pulse::{FetchError, PlatformClient};

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Platform client that replays a script of responses, then repeats the last one.
pub struct ScriptedClient {
    name: String,
    script: Mutex<VecDeque<Result<Vec<Post>, FetchError>>>,
    fallback: Result<Vec<Post>, FetchError>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedClient {
    pub fn new(name: &str, script: Vec<Result<Vec<Post>, FetchError>>) -> Self {
        let fallback = script.last().cloned().unwrap_or(Ok(Vec::new()));
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every call returns the same response.
    pub fn always(name: &str, response: Result<Vec<Post>, FetchError>) -> Self {
        Self::new(name, vec![response])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformClient for ScriptedClient {
    fn platform(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _external_id: &str) -> Result<Vec<Post>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Platform client that answers per external id.
pub struct ByIdClient {
    name: String,
    responses: BTreeMap<String, Result<Vec<Post>, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ByIdClient {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, external_id: &str, response: Result<Vec<Post>, FetchError>) -> Self {
        self.responses.insert(external_id.to_string(), response);
        self
    }

    pub fn calls_for(&self, external_id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|id| *id == external_id).count()
    }
}

#[async_trait]
impl PlatformClient for ByIdClient {
    fn platform(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, external_id: &str) -> Result<Vec<Post>, FetchError> {
        self.calls.lock().unwrap().push(external_id.to_string());
        self.responses
            .get(external_id)
            .cloned()
            .unwrap_or(Ok(Vec::new()))
    }
}

pub fn posts(platform: &str, texts: &[&str]) -> Vec<Post> {
    texts.iter().map(|t| Post::new(platform, "", *t)).collect()
}

pub fn group(org: &str, group: &str) -> GroupInfo {
    GroupInfo {
        org_id: org.to_string(),
        group_id: group.to_string(),
        sub_group_id: None,
        extra: BTreeMap::new(),
    }
}

pub fn entry(org: &str, group_id: &str, subjects: Vec<Subject>) -> RosterSource {
    RosterSource::ok(
        format!("{org}-{group_id}.yaml"),
        RosterEntry {
            group: group(org, group_id),
            subjects,
        },
    )
}

pub fn platforms(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// Orchestrator settings with millisecond-scale waits.
pub fn fast_config(names: &[&str], cooldown: Duration) -> OrchestratorConfig {
    OrchestratorConfig {
        platforms: platforms(names),
        cooldown,
        poll_interval: Duration::from_millis(5),
    }
}

/// Retry controller with tiny, distinct backoff windows per platform.
pub fn fast_controller(names: &[&str]) -> RetryController {
    names
        .iter()
        .enumerate()
        .fold(RetryController::new(5, Duration::from_millis(5)), |controller, (i, name)| {
            let base = 1 + i as u64;
            controller.with_window(name, BackoffWindow { min_ms: base, max_ms: base + 2 })
        })
}

pub fn as_client<C: PlatformClient + 'static>(client: &Arc<C>) -> Arc<dyn PlatformClient> {
    Arc::clone(client) as Arc<dyn PlatformClient>
}

/// Drain every event still buffered in a closed channel.
pub async fn collect_events(mut rx: mpsc::Receiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
