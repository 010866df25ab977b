//! JSON files on disk as the run output.
//!
//! Layout under the configured root:
//!
//! ```text
//! Processed_<YYYYmmdd_HHMMSS>/
//!   org_<orgId>/<groupId>.json              {"groupInfo": ..., "subjectPosts": ...}
//!   org_<orgId>/<groupId>/<subGroupId>.json
//!   retry_results.json                      deferred report, only when non-empty
//! ```

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::errors::{HarvestError, HarvestResult};
use crate::domain::models::{is_safe_path_segment, DeferredReport, RunResult};
use crate::domain::ports::ResultStore;

pub const RETRY_RESULTS_FILE: &str = "retry_results.json";

/// Writes run results as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    root: PathBuf,
}

impl JsonResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn checked_segment<'a>(kind: &str, value: &'a str) -> HarvestResult<&'a str> {
    if is_safe_path_segment(value) {
        Ok(value)
    } else {
        Err(HarvestError::Persist(format!("{kind} '{value}' is not a valid file name")))
    }
}

/// Path of a group's document relative to its organization directory.
///
/// `group` maps to `group.json` and `group/subgroup` to `group/subgroup.json`,
/// so distinct keys never share a file.
pub fn group_file_path(group_key: &str) -> HarvestResult<PathBuf> {
    let mut path = PathBuf::new();
    let mut segments = group_key.split('/').peekable();
    while let Some(segment) = segments.next() {
        let segment = checked_segment("group key segment", segment)?;
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.json"));
        }
    }
    Ok(path)
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> HarvestResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| HarvestError::Persist(format!("{}: {e}", path.display())))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| HarvestError::Persist(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "wrote output file");
    Ok(())
}

#[async_trait]
impl ResultStore for JsonResultStore {
    async fn prepare(&self) -> HarvestResult<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let run_dir = self.root.join(format!("Processed_{stamp}"));
        tokio::fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| HarvestError::Setup(format!("{}: {e}", run_dir.display())))?;
        info!(run_dir = %run_dir.display(), "created run directory");
        Ok(run_dir)
    }

    async fn persist(
        &self,
        run_dir: &Path,
        result: &RunResult,
        deferred: &DeferredReport,
    ) -> HarvestResult<()> {
        let mut files = 0usize;
        for (org_id, groups) in &result.organizations {
            let org_dir = run_dir.join(format!("org_{}", checked_segment("organization id", org_id)?));

            for (group_key, group) in groups {
                let path = org_dir.join(group_file_path(group_key)?);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| HarvestError::Persist(format!("{}: {e}", parent.display())))?;
                }
                write_json(&path, group).await?;
                files += 1;
            }
        }

        if !deferred.is_empty() {
            write_json(&run_dir.join(RETRY_RESULTS_FILE), deferred).await?;
            files += 1;
        }

        info!(run_dir = %run_dir.display(), files, "run output written");
        Ok(())
    }
}
