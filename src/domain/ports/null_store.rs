//! Null result store implementation.
//!
//! Used when the caller keeps the returned report and nothing should be
//! written to disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::ResultStore;
use crate::domain::errors::HarvestResult;
use crate::domain::models::{DeferredReport, RunResult};

/// A no-op store that persists nothing.
#[derive(Debug, Clone, Default)]
pub struct NullResultStore;

impl NullResultStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResultStore for NullResultStore {
    async fn prepare(&self) -> HarvestResult<PathBuf> {
        Ok(PathBuf::new())
    }

    async fn persist(
        &self,
        _run_dir: &Path,
        _result: &RunResult,
        _deferred: &DeferredReport,
    ) -> HarvestResult<()> {
        Ok(())
    }
}
