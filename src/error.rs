use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort the operation that requested them.
/// Asset and sound problems never reach this type; they fall back locally.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("map configuration not found for map id '{0}'")]
    UnknownMap(String),
    #[error("map '{0}' has no waypoints")]
    EmptyPath(String),
    #[error("failed to read config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
