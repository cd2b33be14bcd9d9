use super::{CircuitBreaker, CircuitBreakerTrait};
use crate::base::Transport;
use crate::config::DEFAULT_FAILURE_RATIO;
use crate::{logging, Error, Result};
use http::{Request, Response};
use std::fmt;
use std::time::Instant;

/// `CircuitOpen` is returned by [`BreakerTransport`] when the downstream is
/// unavailable due to a broken circuit. Recover it with `downcast_ref`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitOpen;

impl fmt::Display for CircuitOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circuit open")
    }
}

impl std::error::Error for CircuitOpen {}

/// Decides whether a response the downstream did return counts as a failure.
pub type FailurePredicate<S> = fn(&Response<S>) -> bool;

/// `default_failure` reports any response status code greater than or equal to 400 as a failure.
pub fn default_failure<S>(res: &Response<S>) -> bool {
    res.status().as_u16() >= 400
}

/// `BreakerTransport` is a circuit-breaking client transport.
/// Errors returned by the next transport are always failures, responses are judged
/// by the failure predicate.
pub struct BreakerTransport<T: Transport, B: CircuitBreakerTrait = CircuitBreaker> {
    next: T,
    breaker: B,
    failure: FailurePredicate<T::ResBody>,
}

impl<T: Transport> BreakerTransport<T> {
    /// Trips over a 5% failure rate in a sliding window of 5 seconds, with a 1 second
    /// cooldown before a single trial request is let through.
    pub fn new(failure: FailurePredicate<T::ResBody>, next: T) -> Result<Self> {
        let breaker = CircuitBreaker::new(DEFAULT_FAILURE_RATIO)?;
        Ok(Self::with_breaker(breaker, failure, next))
    }
}

impl<T: Transport, B: CircuitBreakerTrait> BreakerTransport<T, B> {
    pub fn with_breaker(breaker: B, failure: FailurePredicate<T::ResBody>, next: T) -> Self {
        BreakerTransport {
            next,
            breaker,
            failure,
        }
    }

    pub fn breaker(&self) -> &B {
        &self.breaker
    }
}

impl<T: Transport, B: CircuitBreakerTrait> Transport for BreakerTransport<T, B> {
    type ReqBody = T::ReqBody;
    type ResBody = T::ResBody;

    fn round_trip(&self, req: &Request<Self::ReqBody>) -> Result<Response<Self::ResBody>> {
        if !self.breaker.allow() {
            logging::trace!("[BreakerTransport] Request to {} refused", req.uri());
            return Err(Error::new(CircuitOpen));
        }

        let begin = Instant::now();
        let res = self.next.round_trip(req);
        let latency = begin.elapsed();
        match &res {
            Ok(res) if !(self.failure)(res) => self.breaker.success(latency),
            _ => self.breaker.failure(latency),
        }
        res
    }
}
