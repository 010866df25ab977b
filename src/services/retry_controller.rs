//! Per-task retry loop with platform-specific randomized backoff.
//!
//! State machine for one task:
//!
//! ```text
//! Attempting --success--------> Succeeded
//!            --no content-----> NoContent
//!            --rate limited---> RateLimited   (leaves the pass, no budget used)
//!            --fatal----------> Fatal
//!            --transient------> wait(backoff) -> Attempting    while attempts < max
//!                               GivenUp                        once attempts == max
//!            --stop in wait---> Cancelled
//! ```

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::cancellation::{CancellationFlag, WaitOutcome};
use super::events::EventSink;
use crate::domain::models::{
    AttemptOutcome, BackoffWindow, Config, FetchTask, RetryState, TaskResolution,
};
use crate::domain::ports::PlatformClient;

/// Drives one task to a terminal [`TaskResolution`].
#[derive(Debug, Clone)]
pub struct RetryController {
    max_attempts: u32,
    poll_interval: Duration,
    windows: HashMap<String, BackoffWindow>,
}

impl RetryController {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            poll_interval,
            windows: HashMap::new(),
        }
    }

    /// Build from the run settings and every configured platform's window.
    pub fn from_config(config: &Config) -> Self {
        config.platforms.iter().fold(
            Self::new(config.run.max_attempts, config.run.poll_interval()),
            |controller, platform| controller.with_window(&platform.name, platform.backoff),
        )
    }

    #[must_use]
    pub fn with_window(mut self, platform: &str, window: BackoffWindow) -> Self {
        self.windows.insert(platform.to_string(), window);
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Uniformly random delay inside the platform's window.
    ///
    /// Platforms without a window retry immediately.
    pub fn calculate_backoff(&self, platform: &str) -> Duration {
        let Some(window) = self.windows.get(platform) else {
            debug!(platform, "no backoff window configured");
            return Duration::ZERO;
        };
        let (low, high) = if window.min_ms <= window.max_ms {
            (window.min_ms, window.max_ms)
        } else {
            (window.max_ms, window.min_ms)
        };
        Duration::from_millis(rand::rng().random_range(low..=high))
    }

    /// Run the attempt loop for `task` until it reaches a terminal state.
    pub async fn execute(
        &self,
        client: &dyn PlatformClient,
        task: &FetchTask,
        cancel: &CancellationFlag,
        events: &EventSink,
    ) -> TaskResolution {
        let mut state = RetryState::new(self.max_attempts);

        loop {
            let outcome = AttemptOutcome::from(client.fetch(&task.external_id).await);
            match outcome {
                AttemptOutcome::Success(posts) => {
                    return TaskResolution::Succeeded {
                        posts,
                        attempts: state.attempt_count() + 1,
                    };
                }
                AttemptOutcome::NoContent => return TaskResolution::NoContent,
                AttemptOutcome::RateLimited(message) => {
                    return TaskResolution::RateLimited(message);
                }
                AttemptOutcome::Fatal(message) => return TaskResolution::Fatal(message),
                AttemptOutcome::TransientFailure(message) => {
                    if !state.record_failure() {
                        return TaskResolution::GivenUp {
                            attempts: state.attempt_count(),
                            last_error: message,
                        };
                    }

                    let delay = self.calculate_backoff(&task.platform);
                    warn!(
                        platform = %task.platform,
                        subject = %task.subject_key(),
                        external_id = %task.external_id,
                        attempt = state.attempt_count(),
                        max_attempts = state.max_attempts(),
                        delay_secs = delay.as_secs_f64(),
                        error = %message,
                        "transient failure, retry scheduled"
                    );
                    events
                        .log(format!(
                            "Fetching {task} failed: {message}. Retrying in {:.2} minutes (retry {} of {}).",
                            delay.as_secs_f64() / 60.0,
                            state.attempt_count(),
                            state.max_attempts() - 1,
                        ))
                        .await;

                    if cancel.wait(delay, self.poll_interval).await == WaitOutcome::Cancelled {
                        return TaskResolution::Cancelled;
                    }
                }
            }
        }
    }
}
