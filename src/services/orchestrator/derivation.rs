//! Task derivation from roster subjects.

use crate::domain::models::{FetchTask, RosterEntry, Subject};

/// One task per configured platform on which the subject has a non-blank id,
/// in the declared platform order.
pub fn derive_tasks(subject: &Subject, platforms: &[String]) -> Vec<FetchTask> {
    platforms
        .iter()
        .filter_map(|platform| {
            subject
                .external_id(platform)
                .map(|id| FetchTask::new(platform.as_str(), id, subject.clone()))
        })
        .collect()
}

/// All tasks of an entry, subject by subject in roster order.
pub fn plan_entry(entry: &RosterEntry, platforms: &[String]) -> Vec<FetchTask> {
    entry
        .subjects
        .iter()
        .flat_map(|subject| derive_tasks(subject, platforms))
        .collect()
}
