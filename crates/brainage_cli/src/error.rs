use std::path::PathBuf;

use brainage::config::ConfigError;
use brainage::history::JournalError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("could not determine a data directory; set BRAINAGE_DATA_DIR")]
    NoDataDir,
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("terminal i/o failed: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("invalid JSON in {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid game configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Journal(#[from] JournalError),
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(what: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Json {
            what: what.into(),
            source,
        }
    }
}
