//! Run output: the hierarchical result, the deferred report and run statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::post::Post;
use super::roster::{GroupInfo, SubjectKey};

/// Results for one group: its roster header and the posts per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub group_info: GroupInfo,
    pub subject_posts: BTreeMap<SubjectKey, Vec<Post>>,
}

impl GroupResult {
    pub fn new(group_info: GroupInfo) -> Self {
        Self {
            group_info,
            subject_posts: BTreeMap::new(),
        }
    }

    pub fn post_count(&self) -> usize {
        self.subject_posts.values().map(Vec::len).sum()
    }
}

/// organization id -> group key -> group results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResult {
    pub organizations: BTreeMap<String, BTreeMap<String, GroupResult>>,
}

impl RunResult {
    pub fn group(&self, org_id: &str, group_key: &str) -> Option<&GroupResult> {
        self.organizations.get(org_id)?.get(group_key)
    }

    pub fn posts(&self, org_id: &str, group_key: &str, subject: &SubjectKey) -> Option<&[Post]> {
        self.group(org_id, group_key)?
            .subject_posts
            .get(subject)
            .map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupResult> {
        self.organizations.values().flat_map(BTreeMap::values)
    }

    pub fn post_count(&self) -> usize {
        self.groups().map(GroupResult::post_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

/// Posts recovered during the deferred pass, keyed only by subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeferredReport {
    pub subject_posts: BTreeMap<SubjectKey, Vec<Post>>,
}

impl DeferredReport {
    pub fn record(&mut self, key: SubjectKey, posts: Vec<Post>) {
        self.subject_posts.entry(key).or_default().extend(posts);
    }

    pub fn is_empty(&self) -> bool {
        self.subject_posts.is_empty()
    }

    pub fn get(&self, key: &SubjectKey) -> Option<&[Post]> {
        self.subject_posts.get(key).map(Vec::as_slice)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Finished,
    Stopped,
}

/// Task counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub entries_processed: usize,
    pub entries_failed: usize,
    pub tasks_started: usize,
    pub succeeded: usize,
    pub no_content: usize,
    pub rate_limited: usize,
    pub given_up: usize,
    pub fatal: usize,
    pub deferred_recovered: usize,
    pub deferred_dropped: usize,
}

/// Everything a finished or stopped run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub result: RunResult,
    pub deferred: DeferredReport,
    pub stats: RunStats,
    pub run_dir: PathBuf,
}
