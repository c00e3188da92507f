use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embeddings;
use crate::preprocess::PreprocessOptions;

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
/// Default threshold for `analyze` and the moderate tier
const DEFAULT_THRESHOLD: f32 = 0.7;
/// Default threshold for the high-confidence tier
const DEFAULT_STRICT_THRESHOLD: f32 = 0.85;
const DEFAULT_PREVIEW_LENGTH: usize = 100;
const DEFAULT_MAX_TEXTS: usize = 100;
const DEFAULT_NORMALIZATION_TOLERANCE: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Preprocessing applied to texts before embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Enable or disable preprocessing
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub remove_urls: bool,

    #[serde(default = "default_true")]
    pub remove_emails: bool,

    /// Lowercase text
    #[serde(default = "default_true")]
    pub normalize: bool,

    #[serde(default)]
    pub remove_punctuation: bool,

    /// Keep only ASCII letters, digits and spaces
    #[serde(default)]
    pub remove_special: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remove_urls: true,
            remove_emails: true,
            normalize: true,
            remove_punctuation: false,
            remove_special: false,
        }
    }
}

impl PreprocessingConfig {
    /// Options to run, or `None` when preprocessing is disabled.
    pub fn options(&self) -> Option<PreprocessOptions> {
        self.enabled.then(|| self.steps())
    }

    /// The configured steps, regardless of `enabled`.
    pub fn steps(&self) -> PreprocessOptions {
        PreprocessOptions {
            remove_urls: self.remove_urls,
            remove_emails: self.remove_emails,
            normalize: self.normalize,
            remove_punctuation: self.remove_punctuation,
            remove_special: self.remove_special,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Model key used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default similarity threshold [0.0, 1.0]
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,

    /// High-confidence threshold for detailed analysis [0.0, 1.0]
    #[serde(default = "default_strict_threshold")]
    pub strict_threshold: f32,

    /// Preview length in characters
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,

    /// Maximum number of texts accepted per request
    #[serde(default = "default_max_texts")]
    pub max_texts: usize,

    /// Accepted deviation of embedding norms from 1.0
    #[serde(default = "default_normalization_tolerance")]
    pub normalization_tolerance: f32,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub preprocessing: PreprocessingConfig,

    #[serde(skip_serializing, skip_deserializing)]
    pub(crate) base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_model: default_model(),
            default_threshold: default_threshold(),
            strict_threshold: default_strict_threshold(),
            preview_length: default_preview_length(),
            max_texts: default_max_texts(),
            normalization_tolerance: default_normalization_tolerance(),
            cors_origins: default_cors_origins(),
            preprocessing: PreprocessingConfig::default(),
            base_path: PathBuf::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_model() -> String {
    embeddings::DEFAULT_MODEL_KEY.to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_strict_threshold() -> f32 {
    DEFAULT_STRICT_THRESHOLD
}

fn default_preview_length() -> usize {
    DEFAULT_PREVIEW_LENGTH
}

fn default_max_texts() -> usize {
    DEFAULT_MAX_TEXTS
}

fn default_normalization_tolerance() -> f32 {
    DEFAULT_NORMALIZATION_TOLERANCE
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("default_threshold", self.default_threshold),
            ("strict_threshold", self.strict_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }

        if self.preview_length == 0 {
            return Err(ConfigError::Invalid(
                "preview_length must be greater than 0".to_string(),
            ));
        }

        if self.max_texts == 0 {
            return Err(ConfigError::Invalid(
                "max_texts must be greater than 0".to_string(),
            ));
        }

        if !(self.normalization_tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "normalization_tolerance must be positive, got {}",
                self.normalization_tolerance
            )));
        }

        embeddings::lookup(&self.default_model)
            .map_err(|e| ConfigError::Invalid(format!("default_model: {e}")))?;

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, creating it with defaults if it
    /// does not exist.
    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            std::fs::create_dir_all(base_path)?;
            let defaults = Self {
                base_path: base_path.to_path_buf(),
                ..Self::default()
            };
            defaults.save()?;
            log::info!("wrote default config to {}", path.display());
        }

        let config_str = std::fs::read_to_string(&path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory for downloaded embedding models.
    pub fn models_dir(&self) -> PathBuf {
        self.base_path.join("models")
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("DUPFIND_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("DUPFIND_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("DUPFIND_PORT is not a port: {port}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_model, "miniLM");
        assert!((config.default_threshold - 0.7).abs() < f32::EPSILON);
        assert!((config.strict_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.preview_length, 100);
        assert!(config.preprocessing.options().is_none());
    }

    #[test]
    fn test_load_creates_default_file() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("nested");

        let config = Config::load_with(&base).unwrap();

        assert!(base.join(CONFIG_FILE).exists());
        assert_eq!(config.base_path(), base.as_path());
        assert_eq!(config.models_dir(), base.join("models"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "default_threshold: 0.5\npreprocessing:\n  enabled: true\n",
        )
        .unwrap();

        let config = Config::load_with(tmp.path()).unwrap();

        assert!((config.default_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.max_texts, 100);
        assert_eq!(
            config.preprocessing.options(),
            Some(PreprocessOptions::default())
        );
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = Config {
            strict_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_default_model_rejected() {
        let config = Config {
            default_model: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = Config {
            preview_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_texts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            normalization_tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "port: [not, a, port]\n").unwrap();

        let result = Config::load_with(tmp.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::load_with(tmp.path()).unwrap();
        config.max_texts = 12;
        config.save().unwrap();

        let reloaded = Config::load_with(tmp.path()).unwrap();
        assert_eq!(reloaded.max_texts, 12);
    }
}
