//! Credential configuration.
//!
//! The credential file is JSON:
//!
//! ```json
//! {"api_key": "sk-...", "model": "gpt-3.5-turbo", "timeout_sec": 120}
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_provider_openai::{OpenAiProviderConfig, DEFAULT_MODEL};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "MASTERMIND_CONFIG";

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".config/mastermind/config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration path: set MASTERMIND_CONFIG or pass --config")]
    NoConfigPath,

    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration file {path} is missing a non-empty 'api_key'")]
    MissingApiKey { path: PathBuf },

    #[error("configuration file {path}: 'timeout_sec' must be greater than zero")]
    InvalidTimeout { path: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    timeout_sec: Option<u64>,
}

/// Validated credential configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let api_key = non_blank(file.api_key).ok_or_else(|| ConfigError::MissingApiKey {
            path: path.to_path_buf(),
        })?;

        let timeout = match file.timeout_sec {
            Some(0) => {
                return Err(ConfigError::InvalidTimeout {
                    path: path.to_path_buf(),
                })
            }
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        Ok(Self {
            api_key,
            model: non_blank(file.model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_blank(file.base_url),
            organization: non_blank(file.organization),
            timeout,
        })
    }

    #[must_use]
    pub fn provider_config(&self) -> OpenAiProviderConfig {
        let mut config = OpenAiProviderConfig::new(self.api_key.clone(), self.model.clone());
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(organization) = &self.organization {
            config = config.with_organization(organization.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

/// Picks the credential file: an explicit path wins, then
/// `$MASTERMIND_CONFIG`, then `~/.config/mastermind/config.json`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env_string_opt(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_RELATIVE_PATH))
        .ok_or(ConfigError::NoConfigPath)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
