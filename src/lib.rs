#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # Resilience primitives for request-driven clients and servers
//!
//! This crate provides a **circuit breaker**, which stops sending traffic to a failing
//! downstream, and a composable **retry** engine, which decides attempt by attempt whether a
//! failed call is worth another try and how long to wait before it.
//!
//! Both work on the `Request`/`Response` types of the [`http`](https://docs.rs/http) crate and
//! wrap the same [`Transport`](base::Transport) trait, so they compose by one wrapping the other.
//!
//! ## Add Dependency
//!
//! ```toml
//! [dependencies]
//! sentinel-resilience = { version = "0.1.0", features = ["logger_env"] }
//! ```
//!
//! Optional features lists:
//! - logger_env: Use `env_logger` to initialize logging.
//! - logger_log4rs: Use `log4rs` to initialize logging.
//!
//! ## Circuit Breaker
//!
//! The breaker runs its state machine on a dedicated thread and is observed through a sliding
//! window of per-second counters. Every `allow()` that returned `true` must be followed by
//! exactly one `success()` or `failure()`.
//!
//! ```rust
//! use sentinel_resilience::circuitbreaker::CircuitBreaker;
//! use std::time::{Duration, Instant};
//!
//! let breaker = CircuitBreaker::new(0.05).unwrap();
//! if breaker.allow() {
//!     let begin = Instant::now();
//!     // call the protected resource here
//!     breaker.success(begin.elapsed());
//! } else {
//!     // the circuit is open, fail fast
//! }
//! ```
//!
//! `BreakerTransport` and `BreakerHandler` do the bookkeeping for client transports and
//! server handlers respectively.
//!
//! ## Retry
//!
//! ```rust
//! use sentinel_resilience::retry::{All, Backoff, Max, Net, Over, RetryTransport};
//! use std::time::Duration;
//!
//! # fn wrap<T: sentinel_resilience::base::Transport>(next: T) {
//! let transport = RetryTransport::new(next)
//!     .with_retryer(All::new().with(Max(5)).with(Net).with(Over(500)))
//!     .with_delayer(Backoff::Exponential(Duration::from_millis(10)));
//! # }
//! ```
//!
//! ## General Configurations and Initialization
//!
//! The global config is optional. The `api` module provides following interfaces:
//!
//! - `init_default()`: Load configurations from environment variable. For undefined configurations, use default values.
//! - `init_with_config_file(config_path: &mut String)`: Load configurations from a YAML file.
//! - `init_with_config(config_entity: ConfigEntity)`: Use hand-crafted `ConfigEntity`.
//!
//! ```rust
//! use sentinel_resilience::{init_default, logging};
//! init_default().unwrap_or_else(|err| logging::error!("{:?}", err));
//! ```

/// Initialization and builders working on the global config.
pub mod api;
/// Core implementations: the sliding window statistic, the circuit breaker,
/// the retry engine and the configuration.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
// Utility functions, including the injectable clocks.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
