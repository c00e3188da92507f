use crate::{
    config::Config,
    detection::{DetectionOptions, DetectionService},
    embeddings::{EmbeddingProvider, FastEmbedProvider},
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-wide services, built once at startup and shared by handle.
#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub service: Arc<DetectionService>,
}

impl App {
    pub fn new(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let options = DetectionOptions::from_config(&config);
        Self {
            config: Arc::new(config),
            service: Arc::new(DetectionService::new(provider, options)),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        self.service.provider()
    }
}

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Load config from the base path and wire the fastembed provider.
    pub fn create_app() -> Result<App> {
        let base_path = Self::get_base_path()?;
        Self::create_app_with(&base_path)
    }

    pub fn create_app_with(base_path: &Path) -> Result<App> {
        let config = Self::create_config(base_path)?;
        log::debug!("using base path {}", config.base_path().display());
        let provider: Arc<dyn EmbeddingProvider> =
            Arc::new(FastEmbedProvider::new(config.models_dir()));
        Ok(App::new(config, provider))
    }

    /// Create configuration with validation
    pub fn create_config(base_path: &Path) -> Result<Config> {
        std::fs::create_dir_all(base_path)
            .context("Failed to create application base directory")?;

        Config::load_with(base_path)
            .with_context(|| format!("Failed to load config from {}", base_path.display()))
    }

    /// Get the base path for the application
    fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var("DUPFIND_BASE_PATH") {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;

        Ok(home.join(".local/share/dupfind"))
    }
}
