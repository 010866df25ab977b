//! Seam between the passes (main and deferred) and the retry machinery.

use async_trait::async_trait;
use tracing::error;

use super::cancellation::CancellationFlag;
use super::events::EventSink;
use super::platform_registry::PlatformRegistry;
use super::retry_controller::RetryController;
use crate::domain::models::{FetchTask, TaskResolution};

/// Runs one task to a terminal resolution.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: &FetchTask) -> TaskResolution;
}

/// Executes tasks against the registered platform clients through a [`RetryController`].
pub struct PlatformExecutor {
    registry: PlatformRegistry,
    controller: RetryController,
    cancel: CancellationFlag,
    events: EventSink,
}

impl PlatformExecutor {
    pub fn new(
        registry: PlatformRegistry,
        controller: RetryController,
        cancel: CancellationFlag,
        events: EventSink,
    ) -> Self {
        Self {
            registry,
            controller,
            cancel,
            events,
        }
    }
}

#[async_trait]
impl TaskExecutor for PlatformExecutor {
    async fn execute(&self, task: &FetchTask) -> TaskResolution {
        let Some(client) = self.registry.get(&task.platform) else {
            error!(platform = %task.platform, "no client registered for platform");
            return TaskResolution::Fatal(format!(
                "no client registered for platform '{}'",
                task.platform
            ));
        };
        self.controller
            .execute(client.as_ref(), task, &self.cancel, &self.events)
            .await
    }
}
