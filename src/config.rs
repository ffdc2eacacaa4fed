use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Artifact storage configuration
    #[serde(default)]
    pub artifact: ArtifactConfig,

    /// Training configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: LEAKGUARD_)
            .add_source(
                config::Environment::with_prefix("LEAKGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact: ArtifactConfig::default(),
            training: TrainingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory holding the single active model artifact
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Target number of synthetic training rows
    #[serde(default = "default_target_samples")]
    pub target_samples: usize,

    /// Generated segment length per scenario draw (minutes)
    #[serde(default = "default_segment_minutes")]
    pub segment_minutes: u32,

    /// Gaussian noise amplitude relative to base pressure
    #[serde(default = "default_noise_level")]
    pub noise_level: f64,

    /// Number of bagged trees in the ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,

    /// Master seed for reproducible generation and training
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Write the raw training table as CSV next to the artifact
    #[serde(default = "default_true")]
    pub audit_csv: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_samples: default_target_samples(),
            segment_minutes: default_segment_minutes(),
            noise_level: default_noise_level(),
            n_trees: default_n_trees(),
            max_depth: default_max_depth(),
            seed: default_seed(),
            audit_csv: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_artifact_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

fn default_target_samples() -> usize {
    50_000
}

fn default_segment_minutes() -> u32 {
    5
}

fn default_noise_level() -> f64 {
    0.02
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> u16 {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.training.target_samples, 50_000);
        assert_eq!(config.training.segment_minutes, 5);
        assert_eq!(config.training.n_trees, 100);
        assert_eq!(config.training.max_depth, 10);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.artifact.dir, PathBuf::from("./data/models"));
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let parsed: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.training.noise_level, 0.02);
        assert!(parsed.training.audit_csv);
    }
}
