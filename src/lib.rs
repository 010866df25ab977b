//! Pulse - roster-driven social post harvester
//!
//! Pulse reads a roster of organizations, groups and subjects, fetches each
//! subject's posts from every configured platform, and writes the results as
//! a hierarchy of JSON files.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): the orchestrator, retry controller,
//!   deferred queue and result aggregation
//! - **Infrastructure Layer** (`infrastructure`): config, logging, platform
//!   HTTP clients, roster files and the JSON store
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use pulse::{FetchOrchestrator, NullResultStore, PlatformRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = pulse::Config::default();
//!     let registry = pulse::infrastructure::platforms::build_registry(&config)?;
//!     let orchestrator = FetchOrchestrator::from_config(&config, registry, Arc::new(NullResultStore));
//!     let report = orchestrator.run(Vec::new(), pulse::EventSink::disconnected()).await?;
//!     println!("{:?}", report.status);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{FetchError, HarvestError, HarvestResult, RosterError};
pub use domain::models::{
    Config, DeferredReport, FetchTask, GroupInfo, Post, RosterEntry, RosterSource, RunReport,
    RunResult, RunStats, RunStatus, Subject, SubjectKey, TaskResolution,
};
pub use domain::ports::{Classifier, NullResultStore, PlatformClient, ResultStore, RosterReader};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CancellationFlag, DeferredRetryQueue, EventSink, FetchOrchestrator, PlatformRegistry,
    ResultAggregator, RetryController, RunEvent,
};
