//! Composable retrying.
//!
//! A [`RetryTransport`] performs a request, then asks its [`Retryer`] whether the
//! [`Attempt`] should be retried. Retryers come in two flavours:
//!
//! - forbidders (`Max`, `Timeout`) vote `Abort` once a limit is reached, `Ignore` otherwise;
//! - validators (`Over`, `Eof`, `Errors`, `Net`) vote `Retry` on a bad outcome, `Ignore` otherwise.
//!
//! [`All`] merges the votes: any `Abort` stops the loop, otherwise a single `Retry` is enough.
//! An outcome nobody objects to is `Ignore`, which ends the loop as a success.

mod config;
mod decision;
mod delay;
mod error;
mod retryer;
mod transport;

pub use config::*;
pub use decision::*;
pub use delay::*;
pub use error::*;
pub use retryer::*;
pub use transport::*;
