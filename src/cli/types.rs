//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::config::ConfigArgs;
use super::commands::plan::PlanArgs;
use super::commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse - harvest roster subjects' social posts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .pulse/config.yaml and .pulse/local.yaml)
    #[arg(short, long, global = true, env = "PULSE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest posts for every subject in a roster
    Run(RunArgs),

    /// Show the fetch tasks a roster would produce, without fetching
    Plan(PlanArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}
