//! Run CLI command: harvest a roster and write the results.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{MultiProgress, ProgressBar};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::output::progress::{create_percent_bar, create_spinner, ProgressBarExt};
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, RunReport, RunStats, RunStatus};
use crate::domain::ports::RosterReader;
use crate::infrastructure::output::JsonResultStore;
use crate::infrastructure::platforms::build_registry;
use crate::infrastructure::roster::FileRosterReader;
use crate::services::{FetchOrchestrator, RunEvent};

/// Events buffered between the run worker and the terminal
const EVENT_BUFFER: usize = 256;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Roster directory or file
    #[arg(short, long)]
    pub roster: PathBuf,

    /// Output root (overrides output.dir from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    pub status: RunStatus,
    pub run_dir: String,
    pub posts: usize,
    pub deferred_subjects: usize,
    pub stats: RunStats,
}

impl From<&RunReport> for RunOutput {
    fn from(report: &RunReport) -> Self {
        Self {
            status: report.status,
            run_dir: report.run_dir.display().to_string(),
            posts: report.result.post_count(),
            deferred_subjects: report.deferred.subject_posts.len(),
            stats: report.stats,
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let status = match self.status {
            RunStatus::Finished => style("finished").green().bold(),
            RunStatus::Stopped => style("stopped").yellow().bold(),
        };
        format!(
            "Run {status}: {} post(s) written to {}\n{}",
            self.posts,
            self.run_dir,
            TableFormatter::new().format_stats(&self.stats)
        )
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let output_root = args.output.unwrap_or_else(|| config.output.dir.clone());

    let roster = FileRosterReader::new(&args.roster)
        .read()
        .context("Failed to read roster")?;
    let registry = build_registry(config)?;
    let store = Arc::new(JsonResultStore::new(output_root));
    let orchestrator = Arc::new(FetchOrchestrator::from_config(config, registry, store));

    info!(entries = roster.len(), platforms = config.platforms.len(), "starting run");

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let worker = Arc::clone(&orchestrator).spawn(roster, tx);
    let multi = MultiProgress::new();
    let bar = if json_mode {
        create_percent_bar(true)
    } else {
        multi.add(create_percent_bar(false))
    };
    let mut cooldown: Option<ProgressBar> = None;
    let mut stop_requested = false;

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(RunEvent::Progress(percent)) => bar.set_position(u64::from(percent)),
                Some(RunEvent::Log(line)) => {
                    if !json_mode {
                        bar.println(line.clone());
                    }
                    bar.set_message(line);
                }
                Some(RunEvent::CooldownStarted { pending, wait }) if !json_mode => {
                    cooldown = Some(multi.add(create_spinner(format!(
                        "{pending} deferred task(s); waiting {}s before retrying",
                        wait.as_secs()
                    ))));
                }
                Some(RunEvent::CooldownStarted { .. }) => {}
                Some(RunEvent::CooldownEnded) => {
                    if let Some(spinner) = cooldown.take() {
                        spinner.finish_and_clear();
                    }
                }
                Some(RunEvent::Finished) => bar.finish_success("done"),
                Some(RunEvent::Stopped) => bar.finish_warning("stopped"),
                Some(RunEvent::Errored(msg)) => bar.finish_error(msg),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                signal.context("Failed to listen for Ctrl-C")?;
                stop_requested = true;
                if let Some(spinner) = &cooldown {
                    spinner.set_message("stopping...");
                }
                bar.set_message("stopping...");
                orchestrator.stop();
            }
        }
    }

    let report = worker.await.context("Run worker panicked")??;
    output(&RunOutput::from(&report), json_mode);
    Ok(())
}
