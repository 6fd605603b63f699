//! Configuration Loader
//!
//! Layers serialized defaults, an optional configuration file and `TXSENDER__*`
//! environment variables into a validated [`PipelineConfig`].

use super::error::{ConfigResult, ConfigurationError};
use super::PipelineConfig;
use config::{Config, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const ENV_PREFIX: &str = "TXSENDER";
pub const ENV_SEPARATOR: &str = "__";

/// Loaded, validated configuration shared by a worker's components
#[derive(Debug)]
pub struct ConfigManager {
    config: PipelineConfig,
}

impl ConfigManager {
    /// Load configuration from defaults and environment variables
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::build(None)
    }

    /// Load configuration from a TOML/YAML/JSON file, then apply environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigurationError::FileNotFound(path.display().to_string()));
        }
        Self::build(Some(path))
    }

    /// Wrap an already-built configuration after validating it
    pub fn from_config(config: PipelineConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager { config }))
    }

    fn build(path: Option<&Path>) -> ConfigResult<Arc<ConfigManager>> {
        let defaults = Config::try_from(&PipelineConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: PipelineConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigurationError::load_error(source_name(path), e))?;

        config.validate()?;

        info!(
            environment = %config.environment,
            input_topic = %config.kafka.input_topic,
            recover_topic = %config.kafka.recover_topic,
            max_retries = config.backoff.max_retries,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager { config }))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }
}

fn source_name(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "defaults and environment".to_string(),
    }
}
