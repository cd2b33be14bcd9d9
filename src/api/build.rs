use crate::base::{Handler, Transport};
use crate::circuitbreaker::{BreakerHandler, BreakerTransport, CircuitBreaker, FailurePredicate};
use crate::retry::RetryTransport;
use crate::utils::SystemClock;
use crate::{config, Result};
use std::sync::Arc;

/// `circuit_breaker` builds a breaker from the global breaker config.
pub fn circuit_breaker() -> Result<CircuitBreaker> {
    CircuitBreaker::with_config(config::breaker_config(), Arc::new(SystemClock))
}

/// `breaker_transport` wraps `next` with a breaker built from the global breaker config.
pub fn breaker_transport<T: Transport>(
    failure: FailurePredicate<T::ResBody>,
    next: T,
) -> Result<BreakerTransport<T>> {
    Ok(BreakerTransport::with_breaker(
        circuit_breaker()?,
        failure,
        next,
    ))
}

/// `breaker_handler` wraps `next` with a breaker built from the global breaker config.
pub fn breaker_handler<H: Handler>(next: H) -> Result<BreakerHandler<H>> {
    Ok(BreakerHandler::with_breaker(circuit_breaker()?, next))
}

/// `retry_transport` wraps `next` with the retryer and backoff of the global retry config.
pub fn retry_transport<T: Transport>(next: T) -> RetryTransport<T> {
    RetryTransport::with_config(next, &config::retry_config())
}
