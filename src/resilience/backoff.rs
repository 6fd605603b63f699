//! Exponential backoff with jitter.

use crate::config::BackoffConfig;
use std::time::Duration;

/// Backoff policy; call [`ExponentialBackoff::start`] once per retried operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
    /// Re-attempts allowed after the first invocation
    pub max_retries: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for ExponentialBackoff {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            initial_interval: config.initial_interval(),
            max_interval: config.max_interval(),
            multiplier: config.multiplier,
            randomization_factor: config.randomization_factor,
            max_retries: config.max_retries,
        }
    }
}

impl ExponentialBackoff {
    /// Fixed-interval policy without jitter
    pub fn constant(interval: Duration, max_retries: u32) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            randomization_factor: 0.0,
            max_retries,
        }
    }

    pub fn start(&self) -> BackoffState<'_> {
        BackoffState {
            policy: self,
            current_interval: self.initial_interval,
            retries: 0,
        }
    }
}

/// Progress of one retried operation
#[derive(Debug)]
pub struct BackoffState<'a> {
    policy: &'a ExponentialBackoff,
    current_interval: Duration,
    retries: u32,
}

impl BackoffState<'_> {
    /// Wait before the next attempt, or `None` once the retry budget is spent
    ///
    /// The wait is drawn uniformly from `current * [1 - factor, 1 + factor]`; the base
    /// interval then grows by `multiplier` up to `max_interval`.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }
        self.retries += 1;

        let factor = self.policy.randomization_factor.clamp(0.0, 1.0);
        let wait = if factor > 0.0 {
            let jitter = (fastrand::f64() * 2.0 - 1.0) * factor;
            self.current_interval.mul_f64(1.0 + jitter)
        } else {
            self.current_interval
        };

        self.current_interval = self
            .current_interval
            .mul_f64(self.policy.multiplier.max(1.0))
            .min(self.policy.max_interval);

        Some(wait)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}
