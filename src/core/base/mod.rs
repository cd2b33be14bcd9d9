//! Fundamental seams shared by the circuit breaker and the retry engine.

mod transport;

pub use transport::*;

#[cfg(test)]
pub(crate) use transport::test::response;
