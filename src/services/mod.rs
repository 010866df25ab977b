//! Service layer: the harvest run and its building blocks.

pub mod cancellation;
pub mod deferred_queue;
pub mod events;
pub mod executor;
pub mod orchestrator;
pub mod platform_registry;
pub mod result_aggregator;
pub mod retry_controller;

pub use cancellation::{CancellationFlag, WaitOutcome};
pub use deferred_queue::{DeferredRetryQueue, DrainSummary};
pub use events::{progress_percent, EventSink, RunEvent};
pub use executor::{PlatformExecutor, TaskExecutor};
pub use orchestrator::{derive_tasks, plan_entry, FetchOrchestrator, OrchestratorConfig};
pub use platform_registry::PlatformRegistry;
pub use result_aggregator::ResultAggregator;
pub use retry_controller::RetryController;
