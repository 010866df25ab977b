//! Roster files on disk.
//!
//! A roster is a directory of `.yaml`, `.yml` or `.json` files (or a single
//! such file). Each file holds one entry or a list of entries. Files are read
//! in name order so runs are repeatable.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::errors::RosterError;
use crate::domain::models::{RosterEntry, RosterSource};
use crate::domain::ports::RosterReader;

#[derive(Deserialize)]
#[serde(untagged)]
enum RosterDocument {
    Many(Vec<RosterEntry>),
    One(RosterEntry),
}

/// Reads roster entries from the filesystem.
#[derive(Debug, Clone)]
pub struct FileRosterReader {
    path: PathBuf,
}

impl FileRosterReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        let dir = std::fs::read_dir(&self.path)
            .with_context(|| format!("Failed to read roster directory {}", self.path.display()))?;
        for entry in dir {
            let path = entry
                .with_context(|| format!("Failed to list {}", self.path.display()))?
                .path();
            if path.is_file() && is_roster_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_roster_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml" | "yml" | "json")
    )
}

fn parse_document(path: &Path, content: &str) -> Result<RosterDocument, String> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }
}

fn read_file(path: &Path) -> Vec<RosterSource> {
    let origin = path.display().to_string();
    let malformed = |reason: String| {
        vec![RosterSource::failed(
            origin.clone(),
            RosterError::Malformed {
                origin: origin.clone(),
                reason,
            },
        )]
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return malformed(e.to_string()),
    };

    let entries = match parse_document(path, &content) {
        Ok(RosterDocument::One(entry)) => vec![(origin.clone(), entry)],
        Ok(RosterDocument::Many(entries)) => entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| (format!("{origin}#{i}"), entry))
            .collect(),
        Err(reason) => return malformed(reason),
    };

    entries
        .into_iter()
        .map(|(origin, entry)| match entry.validate(&origin) {
            Ok(()) => RosterSource::ok(origin, entry),
            Err(e) => RosterSource::failed(origin, e),
        })
        .collect()
}

impl RosterReader for FileRosterReader {
    fn read(&self) -> Result<Vec<RosterSource>> {
        let files = self.files()?;
        debug!(path = %self.path.display(), files = files.len(), "reading roster");
        Ok(files.iter().flat_map(|path| read_file(path)).collect())
    }
}
