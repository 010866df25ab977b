//! Domain errors for the pulse harvester.

use thiserror::Error;

/// Failure reported by a platform client for a single fetch call.
///
/// The variants are closed on purpose: the retry controller branches on them
/// and nothing else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The platform signalled systemic overload (throttling, captcha wall).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network, timeout, or response parse failure. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The request can never succeed as issued (bad id, missing login).
    #[error("fatal: {0}")]
    Fatal(String),
}

impl FetchError {
    /// Returns true if the error is the systemic throttle condition
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Returns true if the error may clear up on a later attempt
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// A roster entry that cannot be turned into fetch tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("missing required roster field '{field}' in {origin}")]
    MissingField { origin: String, field: String },

    #[error("malformed roster {origin}: {reason}")]
    Malformed { origin: String, reason: String },

    #[error("duplicate subject key '{key}' in {origin}")]
    DuplicateSubject { origin: String, key: String },

    #[error("roster field '{field}' in {origin} cannot be used as a file name: '{value}'")]
    UnsafeName {
        origin: String,
        field: String,
        value: String,
    },
}

/// Errors that abort a whole harvest run.
///
/// Per-task failures never surface here; they are resolved inside the run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to prepare run output: {0}")]
    Setup(String),

    #[error("failed to persist run output: {0}")]
    Persist(String),

    #[error("run worker terminated unexpectedly: {0}")]
    Worker(String),
}

pub type HarvestResult<T> = Result<T, HarvestError>;
