use std::time::Duration;

use crate::domain::errors::{ConfigError, Result};

/// Delay schedule between bus reconnection attempts
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Result<Self> {
        if multiplier <= 1.0 {
            return Err(ConfigError::InvalidParameter {
                name: "backoff multiplier",
                reason: format!("must be > 1.0, got {}", multiplier),
            }
            .into());
        }

        if max_delay < initial_delay {
            return Err(ConfigError::InvalidParameter {
                name: "backoff max delay",
                reason: format!("{:?} is shorter than initial delay {:?}", max_delay, initial_delay),
            }
            .into());
        }

        Ok(Self {
            initial_delay,
            max_delay,
            multiplier,
        })
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Delay to wait after `current`, capped at the maximum
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next = Duration::from_secs_f64(current.as_secs_f64() * self.multiplier);
        next.min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}
