use std::path::PathBuf;

use thiserror::Error;

/// Rejected locomotion configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Dispatch table errors detected at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FsmError {
    #[error("state {0} is not registered in the dispatch table")]
    UnregisteredState(String),
}

/// Anything that can stop a locomotion machine from being built.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fsm(#[from] FsmError),
}
