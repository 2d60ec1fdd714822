//! Reconnect delay policy.
//!
//! DESIGN
//! ======
//! Delays start at `initial` and double per consecutive failure up to `max`.
//! A successful connection resets the sequence. With `max_attempts` set, the
//! policy stops yielding delays once that many consecutive reconnects have
//! been scheduled, and the host gives up.

#[cfg(test)]
#[path = "backoff_test.rs"]
mod backoff_test;

use std::time::Duration;

use crate::config::{ConfigError, env_parse};

pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            max_attempts: None,
        }
    }
}

impl BackoffConfig {
    /// Build the reconnect policy from environment variables.
    ///
    /// Optional:
    /// - `CHAT_RECONNECT_INITIAL_MS`: default 1000
    /// - `CHAT_RECONNECT_MAX_MS`: default 10000
    /// - `CHAT_RECONNECT_MAX_ATTEMPTS`: unbounded when absent
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] when a variable is set but does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let initial_ms = env_parse("CHAT_RECONNECT_INITIAL_MS")?.unwrap_or(DEFAULT_INITIAL_BACKOFF_MS);
        let max_ms = env_parse("CHAT_RECONNECT_MAX_MS")?.unwrap_or(DEFAULT_MAX_BACKOFF_MS);
        let max_attempts = env_parse("CHAT_RECONNECT_MAX_ATTEMPTS")?;
        Ok(Self {
            initial: Duration::from_millis(initial_ms),
            max: Duration::from_millis(max_ms),
            max_attempts,
        })
    }
}

/// Stateful exponential backoff over a [`BackoffConfig`].
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let current = config.initial.min(config.max);
        Self { config, current, attempts: 0 }
    }

    /// Delay before the next reconnect, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(limit) = self.config.max_attempts
            && self.attempts >= limit
        {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.config.max);
        Some(delay)
    }

    /// Forget past failures after a connection proved healthy.
    pub fn reset(&mut self) {
        self.current = self.config.initial.min(self.config.max);
        self.attempts = 0;
    }

    /// Consecutive reconnects scheduled since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
