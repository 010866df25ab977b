//! Roster model: organizations, groups and the subjects to harvest.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::domain::errors::RosterError;

/// Stable composite key of a subject: roster id followed by display name.
///
/// Two subjects sharing a display name stay apart because the id leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn new(id: &str, name: &str) -> Self {
        Self(format!("{id}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person on the roster with their per-platform account ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub platform_ids: BTreeMap<String, String>,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform_ids: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_platform_id(mut self, platform: impl Into<String>, external_id: impl Into<String>) -> Self {
        self.platform_ids.insert(platform.into(), external_id.into());
        self
    }

    pub fn key(&self) -> SubjectKey {
        SubjectKey::new(&self.id, &self.name)
    }

    /// External id for a platform, if present and not blank.
    pub fn external_id(&self, platform: &str) -> Option<&str> {
        self.platform_ids
            .get(platform)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }
}

/// Where a group of subjects sits in the organization hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub org_id: String,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_group_id: Option<String>,
    /// Free-form header fields carried along from the roster.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl GroupInfo {
    /// Key of this group under its organization: `group` or `group/subgroup`.
    pub fn group_key(&self) -> String {
        match self.sub_group_id.as_deref().filter(|s| !s.is_empty()) {
            Some(sub) => format!("{}/{sub}", self.group_id),
            None => self.group_id.clone(),
        }
    }
}

/// Whether `value` can name a single file or directory in the output tree.
///
/// Rejects empty names, `.`, `..` and anything containing a path separator.
pub fn is_safe_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0'])
}

/// One roster record: a group header plus its subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub group: GroupInfo,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl RosterEntry {
    /// Check required fields and subject key uniqueness.
    pub fn validate(&self, origin: &str) -> Result<(), RosterError> {
        let missing = |field: &str| RosterError::MissingField {
            origin: origin.to_string(),
            field: field.to_string(),
        };

        if self.group.org_id.trim().is_empty() {
            return Err(missing("orgId"));
        }
        if self.group.group_id.trim().is_empty() {
            return Err(missing("groupId"));
        }

        let header = [
            ("orgId", Some(self.group.org_id.as_str())),
            ("groupId", Some(self.group.group_id.as_str())),
            ("subGroupId", self.group.sub_group_id.as_deref().filter(|s| !s.is_empty())),
        ];
        for (field, value) in header {
            if let Some(value) = value.filter(|v| !is_safe_path_segment(v)) {
                return Err(RosterError::UnsafeName {
                    origin: origin.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if subject.id.trim().is_empty() {
                return Err(missing("subjects[].id"));
            }
            if subject.name.trim().is_empty() {
                return Err(missing("subjects[].name"));
            }
            let key = subject.key();
            if !seen.insert(key.clone()) {
                return Err(RosterError::DuplicateSubject {
                    origin: origin.to_string(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A roster entry as read from its source, or the reason it could not be read.
#[derive(Debug, Clone)]
pub struct RosterSource {
    /// Human-readable origin (usually a file path)
    pub origin: String,
    pub entry: Result<RosterEntry, RosterError>,
}

impl RosterSource {
    pub fn ok(origin: impl Into<String>, entry: RosterEntry) -> Self {
        Self {
            origin: origin.into(),
            entry: Ok(entry),
        }
    }

    pub fn failed(origin: impl Into<String>, error: RosterError) -> Self {
        Self {
            origin: origin.into(),
            entry: Err(error),
        }
    }
}
