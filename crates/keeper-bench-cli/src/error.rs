//! Error types for the CLI

use std::path::PathBuf;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Bench(#[from] keeper_bench_common::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid node overrides in {path}: {message}")]
    InvalidOverrides { path: PathBuf, message: String },
}

impl Error {
    pub fn invalid_overrides(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::InvalidOverrides {
            path: path.into(),
            message: message.into(),
        }
    }
}
