use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;

/// Largest profit target, as a multiple of the opening bankroll.
const MAX_PROFIT_TARGET: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Everything a deployment can tune, loaded from TOML. Missing keys fall
/// back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    pub engine: EngineConfig,
    pub no_color: bool,
    pub addr: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            no_color: false,
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AdvisorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        let est = &engine.estimator;
        let stake = &engine.stake;

        if est.clamp_low >= est.clamp_high || est.clamp_low <= 0.0 || est.clamp_high >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "estimator clamp band [{}, {}] must sit inside (0, 1)",
                est.clamp_low, est.clamp_high
            )));
        }
        if est.tie < 0.0 || est.tie + est.clamp_high >= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "tie probability {} leaves no room for the player share",
                est.tie
            )));
        }
        if est.jitter < 0.0 {
            return Err(ConfigError::Invalid("jitter must not be negative".into()));
        }
        if stake.min_stake <= Decimal::ZERO {
            return Err(ConfigError::Invalid("min_stake must be positive".into()));
        }
        if stake.grid < Decimal::ZERO {
            return Err(ConfigError::Invalid("grid must not be negative".into()));
        }
        if stake.loss_threshold >= stake.recovery_threshold {
            return Err(ConfigError::Invalid(
                "loss_threshold must sit below recovery_threshold".into(),
            ));
        }
        if stake.profit_target <= Decimal::ONE || stake.profit_target > Decimal::from(MAX_PROFIT_TARGET) {
            return Err(ConfigError::Invalid(format!(
                "profit_target {} must sit in (1, {MAX_PROFIT_TARGET}]",
                stake.profit_target
            )));
        }
        for (name, share) in [
            ("profit_lock_fraction", stake.profit_lock_fraction),
            ("loss_threshold", stake.loss_threshold),
            ("recovery_threshold", stake.recovery_threshold),
        ] {
            if share <= Decimal::ZERO || share > Decimal::ONE {
                return Err(ConfigError::Invalid(format!("{name} {share} must sit in (0, 1]")));
            }
        }
        if engine.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        let commands = &engine.commands;
        for (name, list) in [
            ("start", &commands.start),
            ("end", &commands.end),
            ("reset", &commands.reset),
            ("pause", &commands.pause),
            ("resume", &commands.resume),
            ("status", &commands.status),
            ("help", &commands.help),
        ] {
            if list.is_empty() {
                return Err(ConfigError::Invalid(format!("command '{name}' has no words")));
            }
        }
        Ok(())
    }
}
