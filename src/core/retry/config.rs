use super::{All, Backoff, Eof, Max, Over, Timeout};
use crate::config::{
    DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_OVER_STATUS, DEFAULT_RETRY_ON_EOF,
    DEFAULT_RETRY_TIMEOUT_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The delay strategy between two attempts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// retry immediately
    None,
    Constant,
    Linear,
    Exponential,
    Fibonacci,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::None
    }
}

/// `RetryConfig` describes the retryer and the delayer of a retry transport.
/// A zero limit disables the corresponding retryer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub timeout_ms: u64,
    pub retry_on_eof: bool,
    /// retry when the status code is at least this one
    pub over_status: u16,
    pub backoff: BackoffStrategy,
    /// the time base of the backoff strategy
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: DEFAULT_RETRY_TIMEOUT_MS,
            retry_on_eof: DEFAULT_RETRY_ON_EOF,
            over_status: DEFAULT_OVER_STATUS,
            backoff: BackoffStrategy::default(),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn check(&self) -> Result<()> {
        if self.max_attempts == 0 && self.timeout_ms == 0 {
            return Err(Error::msg(
                "invalid retry config: either max_attempts or timeout_ms must bound the retries",
            ));
        }
        if self.over_status != 0 && !(100..1000).contains(&self.over_status) {
            return Err(Error::msg(format!(
                "invalid over_status {}",
                self.over_status
            )));
        }
        Ok(())
    }

    /// `retryer` composes the retryers this config enables, in the order
    /// `Max`, `Timeout`, `Eof`, `Over`.
    pub fn retryer<Q, S>(&self) -> All<Q, S> {
        let mut all = All::new();
        if self.max_attempts > 0 {
            all = all.with(Max(self.max_attempts));
        }
        if self.timeout_ms > 0 {
            all = all.with(Timeout(Duration::from_millis(self.timeout_ms)));
        }
        if self.retry_on_eof {
            all = all.with(Eof);
        }
        if self.over_status > 0 {
            all = all.with(Over(self.over_status));
        }
        all
    }

    pub fn backoff(&self) -> Option<Backoff> {
        let delta = Duration::from_millis(self.delay_ms);
        match self.backoff {
            BackoffStrategy::None => None,
            BackoffStrategy::Constant => Some(Backoff::Constant(delta)),
            BackoffStrategy::Linear => Some(Backoff::Linear(delta)),
            BackoffStrategy::Exponential => Some(Backoff::Exponential(delta)),
            BackoffStrategy::Fibonacci => Some(Backoff::Fibonacci(delta)),
        }
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", fmtted)
    }
}
