//! # Pipeline Configuration
//!
//! Serde-backed configuration tree for the transaction pipeline. Every section has
//! defaults so a worker can start with no file at all; [`ConfigManager`] layers a file
//! and `TXSENDER__*` environment variables on top.

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::topics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for a pipeline worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub environment: String,
    pub kafka: KafkaConfig,
    pub backoff: BackoffConfig,
    pub listener: ListenerConfig,
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            kafka: KafkaConfig::default(),
            backoff: BackoffConfig::default(),
            listener: ListenerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Topic and consumer-group names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KafkaConfig {
    pub consumer_group: String,
    /// Topic the listener claims partitions from
    pub input_topic: String,
    /// Forward destination for signed envelopes
    pub sender_topic: String,
    /// Destination for envelopes that hit a terminal error
    pub recover_topic: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            consumer_group: topics::DEFAULT_CONSUMER_GROUP.to_string(),
            input_topic: topics::DEFAULT_SENDER_TOPIC.to_string(),
            sender_topic: topics::DEFAULT_SENDER_TOPIC.to_string(),
            recover_topic: topics::DEFAULT_RECOVER_TOPIC.to_string(),
        }
    }
}

/// Exponential backoff parameters for per-message retries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    /// Maximum number of re-attempts after the first invocation
    pub max_retries: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// Jitter ratio applied to every interval, within `[0, 1]`
    pub randomization_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_interval_ms: 500,
            max_interval_ms: 15_000,
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }
}

impl BackoffConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// Deadline applied to every remote call made while processing a message
    pub call_timeout_ms: Option<u64>,
    /// Signing store identifier injected into every job
    pub key_store_name: String,
}

impl ListenerConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; empty means "derive from environment"
    pub level: String,
    pub json: bool,
}

impl PipelineConfig {
    /// Check cross-field consistency of the loaded configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let topics = [
            ("kafka.consumer_group", &self.kafka.consumer_group),
            ("kafka.input_topic", &self.kafka.input_topic),
            ("kafka.sender_topic", &self.kafka.sender_topic),
            ("kafka.recover_topic", &self.kafka.recover_topic),
        ];
        for (field, value) in topics {
            if value.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    field,
                    "kafka configuration",
                ));
            }
        }

        if self.kafka.recover_topic == self.kafka.input_topic {
            return Err(ConfigurationError::invalid_value(
                "kafka.recover_topic",
                self.kafka.recover_topic.clone(),
                "recover topic must differ from the input topic",
            ));
        }

        let backoff = &self.backoff;
        if backoff.initial_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "backoff.initial_interval_ms",
                "0",
                "must be greater than zero",
            ));
        }

        if backoff.max_interval_ms < backoff.initial_interval_ms {
            return Err(ConfigurationError::invalid_value(
                "backoff.max_interval_ms",
                backoff.max_interval_ms.to_string(),
                "must not be lower than backoff.initial_interval_ms",
            ));
        }

        if !(backoff.multiplier >= 1.0) {
            return Err(ConfigurationError::invalid_value(
                "backoff.multiplier",
                backoff.multiplier.to_string(),
                "must be at least 1.0",
            ));
        }

        if !(0.0..=1.0).contains(&backoff.randomization_factor) {
            return Err(ConfigurationError::invalid_value(
                "backoff.randomization_factor",
                backoff.randomization_factor.to_string(),
                "must be within [0, 1]",
            ));
        }

        Ok(())
    }

    /// [`validate`](Self::validate) plus the checks that only matter when the worker
    /// forwards to the sender topic
    pub fn validate_sign_stage(&self) -> Result<(), ConfigurationError> {
        self.validate()?;

        if self.kafka.sender_topic == self.kafka.input_topic {
            return Err(ConfigurationError::invalid_value(
                "kafka.sender_topic",
                self.kafka.sender_topic.clone(),
                "sign stage would forward into its own input topic",
            ));
        }
        Ok(())
    }
}
