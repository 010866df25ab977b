//! Table output formatting for CLI commands
//!
//! Plans and run summaries rendered with comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{FetchTask, RunStats};

/// A roster entry that could not be planned
#[derive(Debug, Clone, serde::Serialize)]
pub struct FailedEntryRow {
    pub origin: String,
    pub error: String,
}

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per fetch task: where it sits and which account it hits
    pub fn format_plan(&self, rows: &[(String, FetchTask)]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            header("Group"),
            header("Subject"),
            header("Platform"),
            header("External ID"),
        ]);

        for (group, task) in rows {
            let platform = if self.use_colors {
                Cell::new(&task.platform).fg(Color::Cyan)
            } else {
                Cell::new(&task.platform)
            };
            table.add_row(vec![
                Cell::new(group),
                Cell::new(truncate(task.subject_key().as_str(), 30)),
                platform,
                Cell::new(&task.external_id),
            ]);
        }

        table.to_string()
    }

    pub fn format_failures(&self, failures: &[FailedEntryRow]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![header("Roster entry"), header("Error")]);
        for failure in failures {
            let error = if self.use_colors {
                Cell::new(&failure.error).fg(Color::Red)
            } else {
                Cell::new(&failure.error)
            };
            table.add_row(vec![Cell::new(&failure.origin), error]);
        }
        table.to_string()
    }

    /// Task outcome counters for a finished or stopped run
    pub fn format_stats(&self, stats: &RunStats) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![header("Outcome"), header("Count")]);

        let rows: [(&str, usize, Color); 10] = [
            ("entries processed", stats.entries_processed, Color::White),
            ("entries failed", stats.entries_failed, Color::Red),
            ("tasks started", stats.tasks_started, Color::White),
            ("succeeded", stats.succeeded, Color::Green),
            ("no content", stats.no_content, Color::DarkGrey),
            ("rate limited", stats.rate_limited, Color::Yellow),
            ("given up", stats.given_up, Color::Red),
            ("fatal", stats.fatal, Color::Red),
            ("deferred recovered", stats.deferred_recovered, Color::Green),
            ("deferred dropped", stats.deferred_dropped, Color::Magenta),
        ];

        for (label, count, color) in rows {
            let count_cell = if self.use_colors && count > 0 {
                Cell::new(count).fg(color)
            } else {
                Cell::new(count)
            };
            table.add_row(vec![Cell::new(label), count_cell]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }
    true
}
