use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::errors::HarvestResult;
use crate::domain::models::{DeferredReport, RunResult};

/// Destination for a run's output.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Create the run location before any work starts. Failure aborts the run.
    async fn prepare(&self) -> HarvestResult<PathBuf>;

    /// Write the run result, and the deferred report when it is non-empty.
    async fn persist(
        &self,
        run_dir: &Path,
        result: &RunResult,
        deferred: &DeferredReport,
    ) -> HarvestResult<()>;
}
