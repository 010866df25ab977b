//! Fetch tasks and their attempt/resolution states.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::post::Post;
use super::roster::{Subject, SubjectKey};
use crate::domain::errors::FetchError;

/// Default cap on attempts for one task within a pass.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// One unit of fetch work: a subject's account on one platform.
///
/// Tasks are values; failed attempts never mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTask {
    pub platform: String,
    pub external_id: String,
    pub subject: Subject,
}

impl FetchTask {
    pub fn new(platform: impl Into<String>, external_id: impl Into<String>, subject: Subject) -> Self {
        Self {
            platform: platform.into(),
            external_id: external_id.into(),
            subject,
        }
    }

    pub fn subject_key(&self) -> SubjectKey {
        self.subject.key()
    }
}

impl fmt::Display for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) on {} [{}]",
            self.subject.name, self.subject.id, self.platform, self.external_id
        )
    }
}

/// Classification of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(Vec<Post>),
    RateLimited(String),
    TransientFailure(String),
    NoContent,
    Fatal(String),
}

impl From<Result<Vec<Post>, FetchError>> for AttemptOutcome {
    fn from(result: Result<Vec<Post>, FetchError>) -> Self {
        match result {
            Ok(posts) if posts.is_empty() => Self::NoContent,
            Ok(posts) => Self::Success(posts),
            Err(FetchError::RateLimited(msg)) => Self::RateLimited(msg),
            Err(FetchError::Transient(msg)) => Self::TransientFailure(msg),
            Err(FetchError::Fatal(msg)) => Self::Fatal(msg),
        }
    }
}

/// Attempt bookkeeping for one task's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt_count: u32,
    max_attempts: u32,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt_count: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Count a failed attempt. Returns true while another attempt is allowed.
    pub fn record_failure(&mut self) -> bool {
        if self.attempt_count < self.max_attempts {
            self.attempt_count += 1;
        }
        self.attempt_count < self.max_attempts
    }

    pub const fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.max_attempts
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Terminal state of a task's retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResolution {
    /// Posts fetched; `attempts` counts the calls made, including the successful one.
    Succeeded { posts: Vec<Post>, attempts: u32 },
    /// The call worked but there was nothing to collect. Never retried.
    NoContent,
    /// Throttled; the task leaves the current pass.
    RateLimited(String),
    /// Transient failures used up the attempt budget.
    GivenUp { attempts: u32, last_error: String },
    /// The platform refused the task outright.
    Fatal(String),
    /// A stop request arrived during a backoff wait.
    Cancelled,
}

impl TaskResolution {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::NoContent => "no_content",
            Self::RateLimited(_) => "rate_limited",
            Self::GivenUp { .. } => "given_up",
            Self::Fatal(_) => "fatal",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A rate-limited task parked for the deferred pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEntry {
    pub platform: String,
    pub external_id: String,
    pub subject: Subject,
}

impl From<FetchTask> for DeferredEntry {
    fn from(task: FetchTask) -> Self {
        Self {
            platform: task.platform,
            external_id: task.external_id,
            subject: task.subject,
        }
    }
}

impl From<DeferredEntry> for FetchTask {
    fn from(entry: DeferredEntry) -> Self {
        Self {
            platform: entry.platform,
            external_id: entry.external_id,
            subject: entry.subject,
        }
    }
}
