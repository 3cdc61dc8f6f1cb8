//! Retry policy for transient page fetch failures.
//!
//! Only failures that may succeed on a second attempt are retried: transport
//! errors, HTTP 429 and 5xx responses. Protocol violations and decode errors
//! abort assembly immediately.
//!
//! # Configuration Example
//!
//! ```toml
//! [paging.retry]
//! enabled = true
//! max_retries = 3
//! base_delay_ms = 200
//! strategy = "exponential"
//! timeout_seconds = 30
//! ```
//!
//! # Retry Strategies
//!
//! - **Constant**: Same delay between each retry
//! - **Linear**: Delay increases linearly (base * attempt)
//! - **Exponential**: Delay doubles each attempt (base * 2^(attempt-1))

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{Error, Result};

/// Upper bound on a single delay, as a multiple of the base delay.
const MAX_DELAY_MULTIPLIER: u32 = 100;

/// Retry configuration for page fetches.
///
/// Paging does not retry unless `[paging.retry]` turns it on; a failed page
/// otherwise ends assembly with a partial collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Enable automatic retries (default: true when the table is present)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of attempts per page, first attempt included (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds (default: 100)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Retry strategy (default: exponential)
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Maximum total time to spend on one page in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            strategy: RetryStrategy::default(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RetryConfig {
    /// Create a retry config with retries disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Calculate the delay after a failed attempt.
    ///
    /// The attempt number is 1-indexed (the delay after the first failure is
    /// attempt 1).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base = self.base_delay();
        let delay = match self.strategy {
            RetryStrategy::Constant => base,
            RetryStrategy::Linear => base.saturating_mul(attempt),
            RetryStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                base.saturating_mul(factor)
            }
        };

        delay
            .min(self.timeout())
            .min(base.saturating_mul(MAX_DELAY_MULTIPLIER))
    }

    /// Check if another attempt is allowed after `attempt` attempts have failed.
    pub fn should_retry(&self, attempt: u32, elapsed: Duration) -> bool {
        if !self.enabled {
            return false;
        }
        attempt < self.max_retries && elapsed < self.timeout()
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_retries == 0 {
            return Err(Error::configuration(
                "paging.retry.max_retries must be at least 1 when retries are enabled",
            ));
        }
        Ok(())
    }
}

/// Retry delay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// Same delay between each retry.
    Constant,
    /// Delay increases linearly: base * attempt.
    Linear,
    /// Delay doubles each attempt: base * 2^(attempt-1).
    #[default]
    Exponential,
}

// Default value functions for serde
fn default_enabled() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}
