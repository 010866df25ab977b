pub mod config;
pub mod post;
pub mod roster;
pub mod run_result;
pub mod task;

pub use config::{
    BackoffWindow, Config, LoggingConfig, OutputConfig, PlatformConfig, PlatformKind, RunConfig,
};
pub use post::{Post, PostTimestamp, Sentiment, SentimentLabel};
pub use roster::{is_safe_path_segment, GroupInfo, RosterEntry, RosterSource, Subject, SubjectKey};
pub use run_result::{
    DeferredReport, GroupResult, RunReport, RunResult, RunStats, RunStatus,
};
pub use task::{
    AttemptOutcome, DeferredEntry, FetchTask, RetryState, TaskResolution, DEFAULT_MAX_ATTEMPTS,
};
