//! CLI error types.

use cactus_config::ConfigError;
use cactus_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid watch pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
