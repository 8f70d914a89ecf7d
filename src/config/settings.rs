use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::ml::{ScoringPolicy, TrainingConfig};

/// Environment variables override the file, e.g. `CPG_TRAINING__EPOCHS=500`
pub const ENV_PREFIX: &str = "CPG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub training: TrainingConfig,
    pub game: GameSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Defaults, then the TOML file (if present), then the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let settings: Settings = source
            .try_deserialize()
            .context("Invalid configuration values")?;

        settings
            .validate()
            .map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(self.training.learning_rate > 0.0 && self.training.learning_rate.is_finite()) {
            errors.push("training.learning_rate must be > 0".to_string());
        }
        if self.training.epochs == 0 {
            errors.push("training.epochs must be > 0".to_string());
        }
        if self.training.batch_size == 0 {
            errors.push("training.batch_size must be > 0".to_string());
        }
        if self.game.log_capacity == 0 {
            errors.push("game.log_capacity must be > 0".to_string());
        }

        let keys = [
            &self.storage.data_key,
            &self.storage.stats_key,
            &self.storage.model_key,
        ];
        if keys.iter().any(|k| k.trim().is_empty()) {
            errors.push("storage keys must not be empty".to_string());
        }
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            errors.push("storage keys must be distinct".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// sled database directory
    pub path: String,
    pub data_key: String,
    pub stats_key: String,
    pub model_key: String,
    /// Seed five sample results when no history is stored yet
    pub seed_sample_data: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "color_prediction.db".to_string(),
            data_key: "color_prediction_game:data".to_string(),
            stats_key: "color_prediction_game:stats".to_string(),
            model_key: "color_prediction_game:model".to_string(),
            seed_sample_data: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub scoring_policy: ScoringPolicy,
    pub log_capacity: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            scoring_policy: ScoringPolicy::Keep,
            log_capacity: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub url: String,
    pub game_uid: String,
    pub connect_delay_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: "https://example.com/#/main".to_string(),
            game_uid: "1969524".to_string(),
            connect_delay_ms: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.training.learning_rate, 0.2);
        assert_eq!(settings.training.epochs, 300);
        assert_eq!(settings.training.batch_size, 16);
        assert_eq!(settings.game.scoring_policy, ScoringPolicy::Keep);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut settings = Settings::default();
        settings.training.learning_rate = 0.0;
        settings.training.epochs = 0;
        settings.training.batch_size = 0;
        settings.storage.stats_key = settings.storage.data_key.clone();

        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.training.learning_rate = 0.15;
        settings.training.seed = Some(9);
        settings.game.scoring_policy = ScoringPolicy::Clear;

        let text = settings.to_toml().unwrap();
        assert!(text.contains("[training]"));
        assert!(text.contains("scoring_policy = \"clear\""));

        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.training, settings.training);
        assert_eq!(parsed.game.scoring_policy, ScoringPolicy::Clear);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let settings = Settings::load("does-not-exist.toml").unwrap();
        assert_eq!(settings.storage.data_key, "color_prediction_game:data");
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let parsed: Settings = toml::from_str("[training]\nepochs = 50\n").unwrap();
        assert_eq!(parsed.training.epochs, 50);
        assert_eq!(parsed.training.batch_size, 16);
        assert_eq!(parsed.server.connect_delay_ms, 800);
    }
}
