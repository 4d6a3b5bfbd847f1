use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use postgrab::media::FetchSettings;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub allowed_hosts: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: None,
            allowed_hosts: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProxySection {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub proxy: ProxySection,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn get_proxy_url(&self) -> Option<&str> {
        self.proxy.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Fetch settings from the `[http]` section, with `timeout_override` taking precedence.
    pub fn fetch_settings(&self, timeout_override: Option<u64>) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            timeout: Duration::from_secs(timeout_override.unwrap_or(self.http.timeout_secs)),
            user_agent: self.http.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}
