// transports and handlers, the seams everything else wraps
pub mod base;
// per-second statistics behind circuit breakers
pub mod stat;
pub mod circuitbreaker;
pub mod config;
pub mod retry;
