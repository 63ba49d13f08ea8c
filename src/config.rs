use std::path::Path;

use crate::ai::{AgentConfig, EncoderConfig, NetworkConfig, RewardConfig};
use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub encoder: EncoderConfig,
    pub reward: RewardConfig,
    pub network: NetworkConfig,
    pub checkpoint: CheckpointManagerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.learning_rate <= 0.0 || self.agent.learning_rate > 1.0 {
            return Err(ConfigError::Validation(
                "agent.learning_rate must be in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.agent.discount_factor) {
            return Err(ConfigError::Validation(
                "agent.discount_factor must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.agent.epsilon) {
            return Err(ConfigError::Validation(
                "agent.epsilon must be in [0, 1]".into(),
            ));
        }
        if self.encoder.board_width == 0 || self.encoder.board_height == 0 {
            return Err(ConfigError::Validation(
                "encoder board dimensions must be > 0".into(),
            ));
        }
        if self.reward.oscillation_run == 0 {
            return Err(ConfigError::Validation(
                "reward.oscillation_run must be > 0".into(),
            ));
        }
        if self.network.hidden_size == 0 {
            return Err(ConfigError::Validation(
                "network.hidden_size must be > 0".into(),
            ));
        }
        if self.network.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "network.learning_rate must be > 0".into(),
            ));
        }
        if self.checkpoint.interval == 0 {
            return Err(ConfigError::Validation(
                "checkpoint.interval must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Render every default value as TOML, for writing a starter config file.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
