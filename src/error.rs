use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed for {repo}: {reason}")]
    Auth { repo: String, reason: String },

    #[error("Fetch task for tag {tag} aborted: {reason}")]
    TaskAborted { tag: String, reason: String },
}

#[derive(Debug, Error)]
#[error("Failed to render feed: {0}")]
pub struct RenderError(#[from] pub rss::Error);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
