//! Public configuration types for the fetch orchestrator.

use std::time::Duration;

use crate::domain::models::Config;

/// Settings the orchestrator needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Platform names in the order their tasks run for each subject.
    pub platforms: Vec<String>,
    /// Wait between the main pass and the deferred pass.
    pub cooldown: Duration,
    /// How often the cooldown wait checks for a stop request.
    pub poll_interval: Duration,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            platforms: config.platforms.iter().map(|p| p.name.clone()).collect(),
            cooldown: config.run.cooldown(),
            poll_interval: config.run.poll_interval(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
