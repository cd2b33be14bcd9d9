use super::{Attempt, Cause, Decision, MaxAttemptsExceeded, TimeoutExceeded};
use std::io;
use std::time::Duration;

/// `Retryer` votes on whether an attempt should be retried.
/// Retryers are stateless across attempts, everything they need is in the `Attempt`.
pub trait Retryer<Q, S>: Send + Sync {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>);
}

impl<Q, S, F> Retryer<Q, S> for F
where
    F: Fn(&Attempt<'_, Q, S>) -> (Decision, Option<Cause>) + Send + Sync,
{
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        self(attempt)
    }
}

/// Aborts once `count` reaches the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Max(pub u32);

impl<Q, S> Retryer<Q, S> for Max {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        if attempt.count >= self.0 {
            let cause = MaxAttemptsExceeded { limit: self.0 };
            return (Decision::Abort, Some(Cause::MaxAttempts(cause)));
        }
        (Decision::Ignore, None)
    }
}

/// Aborts once the limit has passed since the first attempt started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout(pub Duration);

impl<Q, S> Retryer<Q, S> for Timeout {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        if attempt.elapsed() >= self.0 {
            let cause = TimeoutExceeded { limit: self.0 };
            return (Decision::Abort, Some(Cause::Timeout(cause)));
        }
        (Decision::Ignore, None)
    }
}

/// Retries when the response is missing or its status code is at least the given one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Over(pub u16);

impl<Q, S> Retryer<Q, S> for Over {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        let over = attempt
            .status()
            .map_or(true, |status| status.as_u16() >= self.0);
        if over {
            return (Decision::Retry, None);
        }
        (Decision::Ignore, None)
    }
}

/// Retries when the remote end closed the stream early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Eof;

impl<Q, S> Retryer<Q, S> for Eof {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        let eof = attempt.error.map_or(false, |err| {
            io_kinds(err).any(|kind| kind == io::ErrorKind::UnexpectedEof)
        });
        if eof {
            return (Decision::Retry, Some(Cause::Attempt));
        }
        (Decision::Ignore, None)
    }
}

/// Retries on any error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Errors;

impl<Q, S> Retryer<Q, S> for Errors {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        if attempt.error.is_some() {
            return (Decision::Retry, Some(Cause::Attempt));
        }
        (Decision::Ignore, None)
    }
}

/// Retries on network level failures: refused, reset or aborted connections,
/// unreachable addresses, broken pipes and timeouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Net;

impl<Q, S> Retryer<Q, S> for Net {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        use io::ErrorKind::*;
        let net = attempt.error.map_or(false, |err| {
            io_kinds(err).any(|kind| {
                matches!(
                    kind,
                    ConnectionRefused
                        | ConnectionReset
                        | ConnectionAborted
                        | NotConnected
                        | AddrNotAvailable
                        | BrokenPipe
                        | TimedOut
                )
            })
        });
        if net {
            return (Decision::Retry, None);
        }
        (Decision::Ignore, None)
    }
}

fn io_kinds(err: &crate::Error) -> impl Iterator<Item = io::ErrorKind> + '_ {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .map(|cause| cause.kind())
}

/// `All` combines retryers, evaluated left to right.
/// The first `Abort` wins immediately with its cause. Otherwise the greatest decision is
/// returned together with the last cause any retryer reported.
pub struct All<Q, S> {
    retryers: Vec<Box<dyn Retryer<Q, S>>>,
}

impl<Q, S> Default for All<Q, S> {
    fn default() -> Self {
        All {
            retryers: Vec::new(),
        }
    }
}

impl<Q, S> All<Q, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: Retryer<Q, S> + 'static>(mut self, retryer: R) -> Self {
        self.retryers.push(Box::new(retryer));
        self
    }

    pub fn len(&self) -> usize {
        self.retryers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retryers.is_empty()
    }
}

impl<Q, S> Retryer<Q, S> for All<Q, S> {
    fn retry(&self, attempt: &Attempt<'_, Q, S>) -> (Decision, Option<Cause>) {
        let mut result = Decision::Ignore;
        let mut last_cause = None;
        for retryer in &self.retryers {
            let (decision, cause) = retryer.retry(attempt);
            if decision == Decision::Abort {
                return (decision, cause);
            }
            result = result.max(decision);
            if cause.is_some() {
                last_cause = cause;
            }
        }
        (result, last_cause)
    }
}

/// `Max(10)`, `Timeout(30s)`, `Eof` and `Over(300)`.
pub fn default_retryer<Q, S>() -> All<Q, S> {
    All::new()
        .with(Max(crate::config::DEFAULT_MAX_ATTEMPTS))
        .with(Timeout(Duration::from_millis(
            crate::config::DEFAULT_RETRY_TIMEOUT_MS,
        )))
        .with(Eof)
        .with(Over(crate::config::DEFAULT_OVER_STATUS))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::response;
    use crate::{Error, Result};
    use http::{Request, Response};
    use std::time::Instant;

    type Outcome = Result<Response<String>>;

    fn ok(status: u16) -> Outcome {
        Ok(response(status))
    }

    fn err(kind: io::ErrorKind) -> Outcome {
        Err(Error::new(io::Error::from(kind)))
    }

    fn vote<R: Retryer<String, String>>(retryer: &R, count: u32, outcome: &Outcome) -> (Decision, Option<Cause>) {
        let req = Request::new(String::new());
        retryer.retry(&Attempt::new(Instant::now(), count, &req, outcome))
    }

    fn decision<R: Retryer<String, String>>(retryer: &R, count: u32, outcome: &Outcome) -> Decision {
        vote(retryer, count, outcome).0
    }

    #[test]
    fn max() {
        assert_eq!(decision(&Max(2), 1, &ok(200)), Decision::Ignore);
        let (decision, cause) = vote(&Max(2), 2, &ok(200));
        assert_eq!(decision, Decision::Abort);
        assert!(matches!(
            cause,
            Some(Cause::MaxAttempts(MaxAttemptsExceeded { limit: 2 }))
        ));
    }

    #[test]
    fn timeout() {
        let req = Request::new(String::new());
        let outcome = ok(200);
        let past = Instant::now() - Duration::from_secs(20);
        let (d, cause) = Timeout(Duration::from_secs(10)).retry(&Attempt::new(past, 1, &req, &outcome));
        assert_eq!(d, Decision::Abort);
        assert!(matches!(cause, Some(Cause::Timeout(_))));
        assert_eq!(
            decision(&Timeout(Duration::from_secs(10)), 1, &outcome),
            Decision::Ignore
        );
    }

    #[test]
    fn over() {
        assert_eq!(decision(&Over(300), 1, &ok(200)), Decision::Ignore);
        assert_eq!(decision(&Over(300), 1, &ok(300)), Decision::Retry);
        assert_eq!(decision(&Over(300), 1, &ok(503)), Decision::Retry);
        // no response at all
        let (d, cause) = vote(&Over(300), 1, &err(io::ErrorKind::Other));
        assert_eq!(d, Decision::Retry);
        assert!(cause.is_none());
    }

    #[test]
    fn eof() {
        let (d, cause) = vote(&Eof, 1, &err(io::ErrorKind::UnexpectedEof));
        assert_eq!(d, Decision::Retry);
        assert!(matches!(cause, Some(Cause::Attempt)));

        let wrapped: Outcome = Err(Error::new(io::Error::from(io::ErrorKind::UnexpectedEof))
            .context("reading response head"));
        assert_eq!(decision(&Eof, 1, &wrapped), Decision::Retry);

        assert_eq!(decision(&Eof, 1, &err(io::ErrorKind::ConnectionReset)), Decision::Ignore);
        assert_eq!(decision(&Eof, 1, &ok(200)), Decision::Ignore);
    }

    #[test]
    fn errors() {
        let (d, cause) = vote(&Errors, 1, &Err(Error::msg("some error")));
        assert_eq!(d, Decision::Retry);
        assert!(matches!(cause, Some(Cause::Attempt)));
        assert_eq!(decision(&Errors, 1, &ok(500)), Decision::Ignore);
    }

    #[test]
    fn net() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::TimedOut,
        ] {
            let (d, cause) = vote(&Net, 1, &err(kind));
            assert_eq!(d, Decision::Retry, "{:?}", kind);
            assert!(cause.is_none());
        }
        assert_eq!(decision(&Net, 1, &err(io::ErrorKind::InvalidData)), Decision::Ignore);
        assert_eq!(decision(&Net, 1, &Err(Error::msg("dns"))), Decision::Ignore);
    }

    #[test]
    fn net_refused_by_closed_port() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let outcome: Outcome = std::net::TcpStream::connect(addr)
            .map(|_| response(200))
            .map_err(Error::new);
        assert_eq!(decision(&Net, 1, &outcome), Decision::Retry);
    }

    #[test]
    fn compose_over_status_code() {
        let all: All<String, String> = All::new()
            .with(Over(400))
            .with(Max(2))
            .with(Timeout(Duration::from_secs(10)));
        let (d, cause) = vote(&all, 1, &ok(400));
        assert_eq!(d, Decision::Retry);
        assert!(cause.is_none());
    }

    #[test]
    fn compose_max() {
        let all: All<String, String> = All::new().with(Over(400)).with(Max(2));
        let (d, cause) = vote(&all, 3, &ok(400));
        assert_eq!(d, Decision::Abort);
        assert!(matches!(cause, Some(Cause::MaxAttempts(_))));
    }

    #[test]
    fn compose_timeout() {
        let all: All<String, String> = All::new()
            .with(Max(2))
            .with(Timeout(Duration::from_secs(10)));
        let req = Request::new(String::new());
        let outcome = ok(200);
        let past = Instant::now() - Duration::from_secs(20);
        let (d, cause) = all.retry(&Attempt::new(past, 1, &req, &outcome));
        assert_eq!(d, Decision::Abort);
        assert!(matches!(cause, Some(Cause::Timeout(_))));
    }

    #[test]
    fn compose_success() {
        let all: All<String, String> = All::new().with(Max(2)).with(Timeout(Duration::from_secs(10)));
        let (d, cause) = vote(&all, 1, &ok(200));
        assert_eq!(d, Decision::Ignore);
        assert!(cause.is_none());
    }

    #[test]
    fn compose_errors() {
        let all: All<String, String> = All::new()
            .with(Max(2))
            .with(Timeout(Duration::from_secs(10)))
            .with(Errors);
        let (d, cause) = vote(&all, 1, &Err(Error::msg("some error")));
        assert_eq!(d, Decision::Retry);
        assert!(matches!(cause, Some(Cause::Attempt)));
    }

    #[test]
    fn abort_short_circuits() {
        let all: All<String, String> = All::new()
            .with(Max(1))
            .with(|_: &Attempt<'_, String, String>| -> (Decision, Option<Cause>) {
                panic!("evaluated after an abort")
            });
        assert_eq!(decision(&all, 1, &ok(200)), Decision::Abort);
    }

    #[test]
    fn last_cause_wins() {
        let custom = |_: &Attempt<'_, String, String>| {
            (Decision::Ignore, Some(Cause::Other(Error::msg("custom"))))
        };
        let all: All<String, String> = All::new().with(Errors).with(custom);
        let (d, cause) = vote(&all, 1, &Err(Error::msg("downstream")));
        assert_eq!(d, Decision::Retry);
        match cause {
            Some(Cause::Other(e)) => assert_eq!(e.to_string(), "custom"),
            other => panic!("unexpected cause {:?}", other),
        }
    }

    #[test]
    fn empty_all_ignores() {
        let all: All<String, String> = All::new();
        assert!(all.is_empty());
        assert_eq!(decision(&all, 7, &ok(500)), Decision::Ignore);
    }

    #[test]
    fn default_composition() {
        let all = default_retryer::<String, String>();
        assert_eq!(all.len(), 4);
        assert_eq!(decision(&all, 1, &ok(200)), Decision::Ignore);
        assert_eq!(decision(&all, 1, &ok(302)), Decision::Retry);
        assert_eq!(decision(&all, 1, &err(io::ErrorKind::UnexpectedEof)), Decision::Retry);
        assert_eq!(decision(&all, 10, &ok(503)), Decision::Abort);
    }
}
