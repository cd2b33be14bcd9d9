use crate::config::{
    DEFAULT_COOLDOWN_MS, DEFAULT_FAILURE_RATIO, DEFAULT_MIN_OBSERVATIONS, DEFAULT_WINDOW_MS,
    MAX_WINDOW_MS,
};
use crate::{utils, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// `BreakerConfig` encompasses the fields of a circuit breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// `failure_ratio` is the error rate (in `[0.0, 1.0]`) the sliding window must exceed
    /// before the breaker opens.
    pub failure_ratio: f64,
    /// `window_ms` is the span of the sliding window. It is split into one bucket per second,
    /// so it must be within `[1000, MAX_WINDOW_MS]`.
    pub window_ms: u64,
    /// `cooldown_ms` represents the recovery timeout before a single trial request is let through.
    pub cooldown_ms: u64,
    /// `min_observations` is the number of observations in the window that must be
    /// exceeded before the breaker can trip.
    pub min_observations: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        BreakerConfig {
            failure_ratio: DEFAULT_FAILURE_RATIO,
            window_ms: DEFAULT_WINDOW_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
        }
    }
}

impl BreakerConfig {
    pub fn new(failure_ratio: f64) -> Self {
        BreakerConfig {
            failure_ratio,
            ..Default::default()
        }
    }

    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    #[inline]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// `check` validates a config coming from a file or a datasource.
    pub fn check(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.failure_ratio) {
            return Err(Error::msg(format!(
                "invalid failure ratio {} (valid range: [0.0, 1.0])",
                self.failure_ratio
            )));
        }
        if self.window_ms < 1000 {
            return Err(Error::msg(format!(
                "invalid window_ms {}: the sliding window must span at least 1 second",
                self.window_ms
            )));
        }
        if self.window_ms > MAX_WINDOW_MS {
            return Err(Error::msg(format!(
                "invalid window_ms {}: the sliding window must span at most {} ms",
                self.window_ms, MAX_WINDOW_MS
            )));
        }
        if self.cooldown_ms == 0 {
            return Err(Error::msg("invalid cooldown_ms 0"));
        }
        Ok(())
    }

    /// `normalized` is applied when a breaker is constructed programmatically:
    /// the ratio is clamped and unset durations fall back to the defaults.
    /// A window below 1 second or above `MAX_WINDOW_MS` is left as is and rejected
    /// by the sliding window.
    pub(crate) fn normalized(mut self) -> Self {
        self.failure_ratio = utils::clamp_ratio(self.failure_ratio);
        if self.window_ms == 0 {
            self.window_ms = DEFAULT_WINDOW_MS;
        }
        if self.cooldown_ms == 0 {
            self.cooldown_ms = DEFAULT_COOLDOWN_MS;
        }
        self
    }
}

impl fmt::Display for BreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", fmtted)
    }
}
