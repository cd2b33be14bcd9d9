//!  Circuit Breaker State Machine:
//!
//!                                switch to open when the failure ratio is exceeded
//!
//!             +-----------------------------------------------------------------------+
//!             |                                                                       |
//!             |                                                                       v
//!     +----------------+                   +----------------+    Cooldown     +----------------+
//!     |                |                   |                |<----------------|                |
//!     |                |   Probe succeed   |                |                 |                |
//!     |     Closed     |<------------------|    HalfOpen    |                 |      Open      |
//!     |                |                   |                |  Probe admitted |                |
//!     |                |                   |                |  or failed      |                |
//!     |                |                   |                +---------------->|                |
//!     +----------------+                   +----------------+                 +----------------+
//!             ^                                                                       |
//!             |                            Any success                                |
//!             +-----------------------------------------------------------------------+
//!
//! `trip()` forces Open and `reset()` forces Closed from any state.
//! Every transition to Open arms a fresh cooldown, every transition to Closed starts a fresh
//! sliding window.

mod breaker;
mod config;
mod handler;
mod transport;

pub use breaker::*;
pub use config::*;
pub use handler::*;
pub use transport::*;

use std::time::Duration;

/// States of Circuit Breaker State Machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Closed,
    HalfOpen,
    Open,
}

/// `CircuitBreakerTrait` is what collaborators (transports, handlers, middlewares) need from a breaker.
/// Every `allow()` that returned `true` must be followed by exactly one `success()` or `failure()`,
/// otherwise the breaker is starved of trip and recovery signals.
pub trait CircuitBreakerTrait: Send + Sync {
    /// `allow` reports whether a new request may proceed to the protected resource.
    fn allow(&self) -> bool;

    /// `success` reports a completed request. The latency is informational.
    fn success(&self, latency: Duration);

    /// `failure` reports a failed request. The latency is informational.
    fn failure(&self, latency: Duration);

    /// `trip` opens the circuit manually.
    fn trip(&self);

    /// `reset` closes the circuit manually.
    fn reset(&self);

    /// `current_state` returns current state of the circuit breaker.
    fn current_state(&self) -> State;
}

#[cfg(test)]
pub(crate) use test::MockCircuitBreaker;
