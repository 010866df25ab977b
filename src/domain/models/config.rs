use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::task::DEFAULT_MAX_ATTEMPTS;

/// Main configuration structure for pulse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Orchestrator run settings
    #[serde(default)]
    pub run: RunConfig,

    /// Platforms in the order their tasks run for each subject
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformConfig>,

    /// Output location
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            platforms: default_platforms(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn platform(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|p| p.name == name)
    }
}

/// Orchestrator run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Attempts per task before giving up on transient failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before the deferred retry pass, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How often waits check for a stop request, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Attach a keyword sentiment to every fetched post
    #[serde(default)]
    pub classify: bool,
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_cooldown_secs() -> u64 {
    15 * 60
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            cooldown_secs: default_cooldown_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            classify: false,
        }
    }
}

impl RunConfig {
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Which client implementation serves a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Weibo,
    Qzone,
}

/// Uniform random backoff range between retries, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackoffWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl BackoffWindow {
    pub const fn from_secs(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_ms: min_secs * 1000,
            max_ms: max_secs * 1000,
        }
    }

    pub const fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

/// Per-platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlatformConfig {
    /// Name used as the key in roster `platformIds`
    pub name: String,

    /// Client implementation
    pub kind: PlatformKind,

    /// Backoff window for transient failures
    pub backoff: BackoffWindow,

    /// Base URL override (tests, proxies)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Pages fetched per subject
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side pacing; unlimited when absent
    #[serde(default)]
    pub requests_per_minute: Option<u32>,

    /// Extra request headers (cookies, user agent)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

const fn default_pages() -> u32 {
    1
}

const fn default_timeout_secs() -> u64 {
    10
}

impl PlatformConfig {
    pub fn new(name: impl Into<String>, kind: PlatformKind, backoff: BackoffWindow) -> Self {
        Self {
            name: name.into(),
            kind,
            backoff,
            base_url: None,
            pages: default_pages(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: None,
            headers: BTreeMap::new(),
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_platforms() -> Vec<PlatformConfig> {
    vec![
        PlatformConfig::new("weibo", PlatformKind::Weibo, BackoffWindow::from_secs(180, 300)),
        PlatformConfig::new("qzone", PlatformKind::Qzone, BackoffWindow::from_secs(600, 900)),
    ]
}

/// Output location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    /// Directory under which timestamped run directories are created
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when absent
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
