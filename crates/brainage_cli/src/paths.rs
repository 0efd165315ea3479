//! Cross-platform application paths

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Overrides the platform data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "BRAINAGE_DATA_DIR";

#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, AppError> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::data_dir().ok_or(AppError::NoDataDir)?.join("brainage"),
        };
        Self::at(data_dir)
    }

    /// Use `data_dir` as-is, creating it if needed.
    pub fn at(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| AppError::io(&data_dir, e))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("brainage.log")
    }

    /// Backing file for one store key.
    pub fn store_file(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}
