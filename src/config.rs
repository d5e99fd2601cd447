use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

// =============================================================================
// Defaults
// =============================================================================

/// Config file used when neither `--config` nor `TAGWATCH_CONF` is given
pub const DEFAULT_CONFIG_PATH: &str = "tagwatch.yml";

/// Default minimum time between two feed refreshes (4 hours)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 4 * 60 * 60;

/// Default scheduler tick (1 minute)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Timeout for a single registry request in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Upper bound on manifest fetches in flight for one repository
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 32;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

pub const DEFAULT_FEED_TITLE: &str = "Docker registry tags";

pub const DEFAULT_FEED_LINK: &str = "https://hub.docker.com/";

/// Identifies this tool to registries and feed readers
pub const AGENT: &str = concat!("tagwatch/", env!("CARGO_PKG_VERSION"));

/// Top-level configuration loaded from YAML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(rename = "tagwatch")]
    pub watches: Vec<WatchSpec>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// One repository/architecture/pattern combination to monitor
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WatchSpec {
    pub repo: String,
    pub arch: String,
    /// Regular expressions; a tag is watched if any of them matches
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub watch_new: bool,
    pub registry: RegistryEndpoint,
}

/// Connection details of a registry's v2 API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct RegistryEndpoint {
    pub base_url: String,
    /// Whether a bearer token must be fetched from `auth_url` before requests
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
}

impl RegistryEndpoint {
    /// Builds an API URL below the base URL, e.g. `library/ubuntu/tags/list`
    pub fn url(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Basic-auth credentials, only when both parts are non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }

    /// Token endpoint, present only when token auth is enabled
    pub fn token_url(&self) -> Option<&str> {
        if self.auth {
            self.auth_url.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub refresh_interval_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_LISTEN_ADDR.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl ServerConfig {
    /// Listen address with `:port` shorthand expanded to all interfaces
    pub fn listen_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub title: String,
    pub link: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_FEED_TITLE.to_string(),
            link: DEFAULT_FEED_LINK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Reads, parses and validates a YAML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.watches.is_empty() {
            return Err(ConfigError::Invalid("no repositories to watch".to_string()));
        }

        for (i, watch) in self.watches.iter().enumerate() {
            if watch.repo.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("watch #{} has an empty repo", i)));
            }
            if watch.arch.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "watch {} has an empty arch",
                    watch.repo
                )));
            }
            if watch.registry.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "watch {} has an empty registry base_url",
                    watch.repo
                )));
            }
            if watch.registry.auth && watch.registry.auth_url.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "watch {} enables auth without an auth_url",
                    watch.repo
                )));
            }
        }

        if self.server.refresh_interval_secs == 0 || self.server.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "server intervals must be greater than zero".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 || self.fetch.max_concurrent_fetches == 0 {
            return Err(ConfigError::Invalid(
                "fetch timeout and concurrency must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
