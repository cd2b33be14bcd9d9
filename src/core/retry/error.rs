use std::fmt;
use std::time::Duration;

/// `MaxAttemptsExceeded` is the cause reported by the `Max` retryer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAttemptsExceeded {
    pub limit: u32,
}

impl fmt::Display for MaxAttemptsExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "retry limit exceeded after {} attempts", self.limit)
    }
}

impl std::error::Error for MaxAttemptsExceeded {}

/// `TimeoutExceeded` is the cause reported by the `Timeout` retryer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutExceeded {
    pub limit: Duration,
}

impl fmt::Display for TimeoutExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {:.2} seconds", self.limit.as_secs_f64())
    }
}

impl std::error::Error for TimeoutExceeded {}
