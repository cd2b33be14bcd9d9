//! Statistic structures of the circuit breaker: second-granularity counters
//! arranged in a ring that slides along with the clock.

mod counter;
mod sliding_window_metric;

pub use counter::*;
pub use sliding_window_metric::*;
