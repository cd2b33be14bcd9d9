use super::{MaxAttemptsExceeded, TimeoutExceeded};
use crate::{Error, Result};
use http::{Request, Response, StatusCode};
use std::time::{Duration, Instant};

/// The vote of a retryer on a single attempt, ordered `Abort < Ignore < Retry`.
/// Combining votes keeps the maximum, unless one of them aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
    /// stop now, the cause explains why
    Abort,
    /// no opinion
    Ignore,
    /// try again
    Retry,
}

impl Default for Decision {
    fn default() -> Self {
        Decision::Ignore
    }
}

/// Why a retryer voted the way it did.
#[derive(Debug)]
pub enum Cause {
    /// the error of the attempt itself, passed through unchanged
    Attempt,
    MaxAttempts(MaxAttemptsExceeded),
    Timeout(TimeoutExceeded),
    /// raised by user defined retryers
    Other(Error),
}

impl Cause {
    /// The error replacing the outcome of the attempt, `None` when the outcome stands.
    pub fn into_error(self) -> Option<Error> {
        match self {
            Cause::Attempt => None,
            Cause::MaxAttempts(e) => Some(Error::new(e)),
            Cause::Timeout(e) => Some(Error::new(e)),
            Cause::Other(e) => Some(e),
        }
    }
}

/// `Attempt` is the snapshot of one iteration of the retry loop handed to retryers and delayers.
pub struct Attempt<'a, Q, S> {
    /// when the first attempt started
    pub start: Instant,
    /// 1-based
    pub count: u32,
    pub error: Option<&'a Error>,
    pub request: &'a Request<Q>,
    pub response: Option<&'a Response<S>>,
}

impl<'a, Q, S> Attempt<'a, Q, S> {
    pub fn new(
        start: Instant,
        count: u32,
        request: &'a Request<Q>,
        outcome: &'a Result<Response<S>>,
    ) -> Self {
        let (response, error) = match outcome {
            Ok(res) => (Some(res), None),
            Err(err) => (None, Some(err)),
        };
        Attempt {
            start,
            count,
            error,
            request,
            response,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.response.map(|res| res.status())
    }
}
