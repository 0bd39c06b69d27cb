use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every knob has a baked-in default matching the training recipe, so both
/// subcommands run with no config file present. `config/default.toml` and
/// `DIARISK__`-prefixed environment variables override the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Remote CSV with the Pima Indians diabetes data (headerless, 9 columns)
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Seed for the train/test split and batch shuffling
    pub seed: u64,
    /// Fraction of samples held out for evaluation (e.g. 0.2 = 20%)
    pub test_fraction: f64,
    /// Full passes over the training partition
    pub epochs: usize,
    /// Samples per optimizer step
    pub batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Decision threshold used for evaluation
    pub threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Where the trainer writes and the server reads the artifact
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the prediction API
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/jbrownlee/Datasets/master/pima-indians-diabetes.data.csv";

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with the fixed training recipe
            .set_default("dataset.url", DEFAULT_DATASET_URL)?
            .set_default("training.seed", 42)?
            .set_default("training.test_fraction", 0.2)?
            .set_default("training.epochs", 100)?
            .set_default("training.batch_size", 16)?
            .set_default("training.learning_rate", 1e-3)?
            .set_default("training.threshold", 0.5)?
            .set_default("model.artifact_path", "models/diarisk.json")?
            .set_default("server.port", 5000)?
            .set_default("logging.level", "info")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Override with environment variables (DIARISK__SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("DIARISK")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.training.test_fraction <= 0.0 || self.training.test_fraction >= 1.0 {
            errors.push("training.test_fraction must be between 0 and 1".to_string());
        }

        if self.training.epochs == 0 {
            errors.push("training.epochs must be positive".to_string());
        }

        if self.training.batch_size == 0 {
            errors.push("training.batch_size must be positive".to_string());
        }

        if self.training.learning_rate <= 0.0 {
            errors.push("training.learning_rate must be positive".to_string());
        }

        if self.training.threshold <= 0.0 || self.training.threshold >= 1.0 {
            errors.push("training.threshold must be between 0 and 1".to_string());
        }

        if self.dataset.url.is_empty() {
            errors.push("dataset.url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_training_recipe() {
        let cfg = AppConfig::load_from("/nonexistent").unwrap();

        assert_eq!(cfg.training.seed, 42);
        assert_eq!(cfg.training.test_fraction, 0.2);
        assert_eq!(cfg.training.epochs, 100);
        assert_eq!(cfg.training.batch_size, 16);
        assert_eq!(cfg.server.port, 5000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_fraction_fails_validation() {
        let mut cfg = AppConfig::load_from("/nonexistent").unwrap();
        cfg.training.test_fraction = 1.5;

        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("test_fraction")));
    }
}
