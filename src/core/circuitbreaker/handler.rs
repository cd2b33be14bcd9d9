use super::{CircuitBreaker, CircuitBreakerTrait};
use crate::base::Handler;
use crate::config::DEFAULT_FAILURE_RATIO;
use crate::{logging, Result};
use http::{Request, Response, StatusCode};
use std::time::Instant;

/// `BreakerHandler` guards a server side [`Handler`]. While the circuit is open it answers
/// `503 Service Unavailable` with an empty body, without calling the inner handler.
/// Responses with a status of 500 or above are failures, anything else is a success.
pub struct BreakerHandler<H: Handler, B: CircuitBreakerTrait = CircuitBreaker> {
    next: H,
    breaker: B,
}

impl<H: Handler> BreakerHandler<H> {
    /// Trips over a 5% failure rate in a sliding window of 5 seconds, with a 1 second
    /// cooldown before a single trial request is let through.
    pub fn new(next: H) -> Result<Self> {
        let breaker = CircuitBreaker::new(DEFAULT_FAILURE_RATIO)?;
        Ok(Self::with_breaker(breaker, next))
    }
}

impl<H: Handler, B: CircuitBreakerTrait> BreakerHandler<H, B> {
    pub fn with_breaker(breaker: B, next: H) -> Self {
        BreakerHandler { next, breaker }
    }

    pub fn breaker(&self) -> &B {
        &self.breaker
    }

    fn serve_closed(&self, req: &Request<H::ReqBody>) -> Response<H::ResBody> {
        let begin = Instant::now();
        let res = self.next.serve(req);
        let latency = begin.elapsed();
        if res.status().is_server_error() {
            self.breaker.failure(latency);
        } else {
            self.breaker.success(latency);
        }
        res
    }
}

impl<H, B> Handler for BreakerHandler<H, B>
where
    H: Handler,
    H::ResBody: Default,
    B: CircuitBreakerTrait,
{
    type ReqBody = H::ReqBody;
    type ResBody = H::ResBody;

    fn serve(&self, req: &Request<Self::ReqBody>) -> Response<Self::ResBody> {
        if self.breaker.allow() {
            return self.serve_closed(req);
        }
        logging::trace!("[BreakerHandler] Request to {} refused", req.uri());
        let mut res = Response::new(H::ResBody::default());
        *res.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
        res
    }
}
