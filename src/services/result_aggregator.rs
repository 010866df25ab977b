//! Builds the organization -> group -> subject result hierarchy.

use crate::domain::models::{GroupInfo, GroupResult, Post, RunResult, Subject};

/// Append-only accumulator for a run's main-pass results.
///
/// Posts for a subject are kept in the order they were recorded, which is
/// platform fetch order. They are not re-sorted by timestamp.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    result: RunResult,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a group exists in the output even if none of its tasks succeed.
    pub fn register_group(&mut self, group: &GroupInfo) -> &mut GroupResult {
        self.result
            .organizations
            .entry(group.org_id.clone())
            .or_default()
            .entry(group.group_key())
            .or_insert_with(|| GroupResult::new(group.clone()))
    }

    /// Append `posts` to the subject's sequence within `group`.
    pub fn record(&mut self, group: &GroupInfo, subject: &Subject, posts: Vec<Post>) {
        self.register_group(group)
            .subject_posts
            .entry(subject.key())
            .or_default()
            .extend(posts);
    }

    pub fn into_run_result(self) -> RunResult {
        self.result
    }
}
