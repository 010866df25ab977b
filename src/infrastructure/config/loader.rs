use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid poll_interval_ms: {0}. Must be between 1 and 1000")]
    InvalidPollInterval(u64),

    #[error("At least one platform must be configured")]
    NoPlatforms,

    #[error("Platform name cannot be empty")]
    EmptyPlatformName,

    #[error("Platform '{0}' is configured more than once")]
    DuplicatePlatform(String),

    #[error("Invalid backoff for '{name}': min_ms ({min_ms}) must not exceed max_ms ({max_ms})")]
    InvalidBackoff { name: String, min_ms: u64, max_ms: u64 },

    #[error("Platforms '{0}' and '{1}' share the same backoff window; each platform needs its own")]
    SharedBackoffWindow(String, String),

    #[error("Invalid pages for '{0}': must be between 1 and 1000")]
    InvalidPages(String),

    #[error("Invalid requests_per_minute for '{0}': must be at least 1")]
    InvalidRequestRate(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Waits must notice a stop request within a second.
pub const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Upper bound on pages fetched per subject and platform.
pub const MAX_PAGES: u32 = 1000;

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .pulse/config.yaml (project config)
    /// 3. .pulse/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PULSE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".pulse/config.yaml"))
            .merge(Yaml::file(".pulse/local.yaml"))
            .merge(Env::prefixed("PULSE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PULSE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.run.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.run.max_attempts));
        }

        if !(1..=MAX_POLL_INTERVAL_MS).contains(&config.run.poll_interval_ms) {
            return Err(ConfigError::InvalidPollInterval(config.run.poll_interval_ms));
        }

        if config.platforms.is_empty() {
            return Err(ConfigError::NoPlatforms);
        }

        let mut names = HashSet::new();
        for platform in &config.platforms {
            if platform.name.trim().is_empty() {
                return Err(ConfigError::EmptyPlatformName);
            }
            if !names.insert(platform.name.as_str()) {
                return Err(ConfigError::DuplicatePlatform(platform.name.clone()));
            }
            if platform.backoff.min_ms > platform.backoff.max_ms {
                return Err(ConfigError::InvalidBackoff {
                    name: platform.name.clone(),
                    min_ms: platform.backoff.min_ms,
                    max_ms: platform.backoff.max_ms,
                });
            }
            if !(1..=MAX_PAGES).contains(&platform.pages) {
                return Err(ConfigError::InvalidPages(platform.name.clone()));
            }
            if platform.requests_per_minute == Some(0) {
                return Err(ConfigError::InvalidRequestRate(platform.name.clone()));
            }
        }

        for (i, a) in config.platforms.iter().enumerate() {
            if let Some(b) = config.platforms[i + 1..].iter().find(|b| b.backoff == a.backoff) {
                return Err(ConfigError::SharedBackoffWindow(a.name.clone(), b.name.clone()));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{BackoffWindow, PlatformConfig, PlatformKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.run.max_attempts, 5);
        assert_eq!(config.run.cooldown_secs, 900);
        assert_eq!(config.platforms.len(), 2);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
run:
  max_attempts: 3
  cooldown_secs: 60
platforms:
  - name: weibo
    kind: weibo
    backoff: { min_ms: 1000, max_ms: 2000 }
    pages: 2
    headers:
      cookie: SUB=abc
  - name: qzone
    kind: qzone
    backoff: { min_ms: 5000, max_ms: 9000 }
    requests_per_minute: 20
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.run.max_attempts, 3);
        assert_eq!(config.run.poll_interval_ms, 1000, "unset field keeps its default");
        assert_eq!(config.platforms[0].pages, 2);
        assert_eq!(config.platforms[0].headers.get("cookie").map(String::as_str), Some("SUB=abc"));
        assert_eq!(config.platforms[1].kind, PlatformKind::Qzone);
        assert_eq!(config.platforms[1].requests_per_minute, Some(20));
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.run.max_attempts = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxAttempts(0))
        ));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.run.poll_interval_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPollInterval(0))
        ));
    }

    #[test]
    fn test_validate_poll_interval_above_one_second() {
        let mut config = Config::default();
        config.run.poll_interval_ms = MAX_POLL_INTERVAL_MS;
        assert!(ConfigLoader::validate(&config).is_ok());

        config.run.poll_interval_ms = 3000;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPollInterval(3000))
        ));
    }

    #[test]
    fn test_validate_no_platforms() {
        let mut config = Config::default();
        config.platforms.clear();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::NoPlatforms)));
    }

    #[test]
    fn test_validate_duplicate_platform() {
        let mut config = Config::default();
        config.platforms.push(PlatformConfig::new(
            "weibo",
            PlatformKind::Weibo,
            BackoffWindow::from_secs(1, 2),
        ));
        match ConfigLoader::validate(&config) {
            Err(ConfigError::DuplicatePlatform(name)) => assert_eq!(name, "weibo"),
            other => panic!("Expected DuplicatePlatform, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_inverted_backoff() {
        let mut config = Config::default();
        config.platforms[0].backoff = BackoffWindow { min_ms: 10, max_ms: 5 };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff { min_ms: 10, max_ms: 5, .. })
        ));
    }

    #[test]
    fn test_validate_shared_backoff_window() {
        let mut config = Config::default();
        config.platforms[1].backoff = config.platforms[0].backoff;
        match ConfigLoader::validate(&config) {
            Err(ConfigError::SharedBackoffWindow(a, b)) => {
                assert_eq!(a, "weibo");
                assert_eq!(b, "qzone");
            }
            other => panic!("Expected SharedBackoffWindow, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_zero_pages_and_rate() {
        let mut config = Config::default();
        config.platforms[0].pages = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPages(_))));

        let mut config = Config::default();
        config.platforms[1].pages = 300_000_000;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidPages(_))));

        let mut config = Config::default();
        config.platforms[1].requests_per_minute = Some(0);
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRequestRate(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            _ => panic!("Expected InvalidLogLevel error"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogFormat(format)) => assert_eq!(format, "xml"),
            _ => panic!("Expected InvalidLogFormat error"),
        }
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "run:\n  max_attempts: 4\n  cooldown_secs: 30\nlogging:\n  level: warn").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("PULSE_RUN__COOLDOWN_SECS", Some("5")),
                ("PULSE_LOGGING__FORMAT", Some("json")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).expect("config should load");
                assert_eq!(config.run.max_attempts, 4, "file value should persist");
                assert_eq!(config.run.cooldown_secs, 5, "env should win over file");
                assert_eq!(config.logging.level, "warn");
                assert_eq!(config.logging.format, "json");
                assert_eq!(config.platforms.len(), 2, "defaults fill the rest");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "run:\n  max_attempts: 5\nlogging:\n  level: info\n  format: json").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "run:\n  max_attempts: 2\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.run.max_attempts, 2, "Override should win");
        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
