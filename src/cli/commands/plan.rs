//! Plan CLI command: derive fetch tasks from a roster without fetching.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::table::FailedEntryRow;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, FetchTask, RosterSource};
use crate::domain::ports::RosterReader;
use crate::infrastructure::roster::FileRosterReader;
use crate::services::plan_entry;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Roster directory or file
    #[arg(short, long)]
    pub roster: PathBuf,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    pub org_id: String,
    pub group: String,
    #[serde(flatten)]
    pub task: FetchTask,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub entries: usize,
    pub tasks: Vec<PlannedTask>,
    pub failed: Vec<FailedEntryRow>,
}

impl PlanOutput {
    pub fn build(sources: &[RosterSource], platforms: &[String]) -> Self {
        let mut tasks = Vec::new();
        let mut failed = Vec::new();

        for source in sources {
            match &source.entry {
                Ok(entry) => {
                    let group = entry.group.group_key();
                    tasks.extend(plan_entry(entry, platforms).into_iter().map(|task| PlannedTask {
                        org_id: entry.group.org_id.clone(),
                        group: group.clone(),
                        task,
                    }));
                }
                Err(e) => failed.push(FailedEntryRow {
                    origin: source.origin.clone(),
                    error: e.to_string(),
                }),
            }
        }

        Self {
            entries: sources.len(),
            tasks,
            failed,
        }
    }
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let mut out = format!(
            "{} roster entr{}, {} fetch task(s)\n",
            self.entries,
            if self.entries == 1 { "y" } else { "ies" },
            self.tasks.len()
        );

        if !self.tasks.is_empty() {
            let rows: Vec<(String, FetchTask)> = self
                .tasks
                .iter()
                .map(|t| (format!("{}/{}", t.org_id, t.group), t.task.clone()))
                .collect();
            out.push_str(&formatter.format_plan(&rows));
            out.push('\n');
        }

        if !self.failed.is_empty() {
            out.push_str(&format!("\nSkipped roster entries: {}\n", self.failed.len()));
            out.push_str(&formatter.format_failures(&self.failed));
        }

        out
    }
}

pub async fn execute(args: PlanArgs, config: &Config, json_mode: bool) -> Result<()> {
    let platforms: Vec<String> = config.platforms.iter().map(|p| p.name.clone()).collect();
    let sources = FileRosterReader::new(&args.roster)
        .read()
        .context("Failed to read roster")?;

    output(&PlanOutput::build(&sources, &platforms), json_mode);
    Ok(())
}
