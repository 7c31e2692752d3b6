//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use harvest_core::RetryPolicy;
use harvest_github::{GITHUB_API_URL, Project};
use serde::Deserialize;

/// Environment variable consulted when no token is configured
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Global configuration for harvest
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub github: GithubConfig,
    pub http: HttpSettings,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
    pub database: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: PathBuf::from("database.duck"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: std::env::var(TOKEN_ENV).ok(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub max_attempts: u32,
    pub throttle_secs: u64,
    pub cooldown_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub page_limit: Option<u32>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        let http = harvest_core::HttpConfig::default();
        Self {
            max_attempts: policy.max_attempts,
            throttle_secs: policy.throttle.as_secs(),
            cooldown_secs: policy.cooldown.as_secs(),
            connect_timeout_secs: http.connect_timeout.as_secs(),
            request_timeout_secs: http.request_timeout.as_secs(),
            page_limit: None,
        }
    }
}

impl HttpSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            throttle: Duration::from_secs(self.throttle_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn http_config(&self) -> harvest_core::HttpConfig {
        harvest_core::HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .and_then(|s| expand_env_var(&s))
        .or_else(|| std::env::var(TOKEN_ENV).ok()))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./harvest.toml (current directory)
    /// 2. ~/.config/harvest/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("harvest.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "harvest") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Token and project list are required before any request is made.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.github.token.as_deref().is_some_and(|t| !t.is_empty()),
            "No GitHub token configured (set {TOKEN_ENV} or [github].token)"
        );
        anyhow::ensure!(
            !self.projects.is_empty(),
            "No projects configured (add [[projects]] entries)"
        );
        Ok(())
    }
}
