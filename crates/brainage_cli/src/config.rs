//! `config.json` plus environment overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use brainage::config::GameConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coach::CoachConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub game: GameConfig,
    /// Most sessions kept in history; `None` keeps everything.
    #[serde(default = "default_history_cap")]
    pub history_cap: Option<usize>,
    /// Fixed PRNG seed; the clock seeds otherwise.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub coach: CoachConfig,
}

fn default_history_cap() -> Option<usize> {
    Some(200)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            history_cap: default_history_cap(),
            seed: None,
            coach: CoachConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `path` (missing file means defaults), then apply the process environment.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_overrides(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::json(path.display().to_string(), e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::io(path, e)),
        }
    }

    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::json(path.display().to_string(), e))?;
        fs::write(path, raw).map_err(|e| AppError::io(path, e))
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // BRAINAGE_SEED=42
        if let Some(v) = var("BRAINAGE_SEED") {
            match v.trim().parse::<u64>() {
                Ok(seed) => self.seed = Some(seed),
                Err(_) => warn!(value = %v, "ignoring non-numeric BRAINAGE_SEED"),
            }
        }
        // BRAINAGE_HISTORY_CAP=100 (0 = unbounded)
        if let Some(v) = var("BRAINAGE_HISTORY_CAP") {
            match v.trim().parse::<usize>() {
                Ok(0) => self.history_cap = None,
                Ok(n) => self.history_cap = Some(n),
                Err(_) => warn!(value = %v, "ignoring non-numeric BRAINAGE_HISTORY_CAP"),
            }
        }
        self.coach.apply_overrides(&var);
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.game.validate()?;
        if self.history_cap == Some(0) {
            return Err(AppError::Usage(
                "history_cap must be at least 1 (use null for unbounded)".to_string(),
            ));
        }
        Ok(())
    }
}
