use super::{default_retryer, Attempt, Decision, Delayer, RetryConfig, Retryer};
use crate::base::Transport;
use crate::{logging, Result};
use http::{Request, Response};
use std::time::Instant;

/// `RetryTransport` sends a request again until its retryer stops voting `Retry`.
///
/// Each attempt is judged by the retryer. A `Retry` decision sleeps through the delayer
/// (if any) and tries again, any other decision returns the outcome of the last attempt,
/// with its error replaced by the cause the retryer reported, if any.
pub struct RetryTransport<T: Transport> {
    next: T,
    retryer: Box<dyn Retryer<T::ReqBody, T::ResBody>>,
    delayer: Option<Box<dyn Delayer<T::ReqBody, T::ResBody>>>,
}

impl<T: Transport> RetryTransport<T> {
    /// Retries with [`default_retryer`] and no delay between attempts.
    pub fn new(next: T) -> Self {
        RetryTransport {
            next,
            retryer: Box::new(default_retryer()),
            delayer: None,
        }
    }

    pub fn with_config(next: T, config: &RetryConfig) -> Self {
        let transport = Self::new(next).with_retryer(config.retryer());
        match config.backoff() {
            Some(backoff) => transport.with_delayer(backoff),
            None => transport,
        }
    }

    pub fn with_retryer<R>(mut self, retryer: R) -> Self
    where
        R: Retryer<T::ReqBody, T::ResBody> + 'static,
    {
        self.retryer = Box::new(retryer);
        self
    }

    pub fn with_delayer<D>(mut self, delayer: D) -> Self
    where
        D: Delayer<T::ReqBody, T::ResBody> + 'static,
    {
        self.delayer = Some(Box::new(delayer));
        self
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    type ReqBody = T::ReqBody;
    type ResBody = T::ResBody;

    fn round_trip(&self, req: &Request<Self::ReqBody>) -> Result<Response<Self::ResBody>> {
        let start = Instant::now();
        let mut count = 1;
        loop {
            let outcome = self.next.round_trip(req);
            let attempt = Attempt::new(start, count, req, &outcome);
            let (decision, cause) = self.retryer.retry(&attempt);
            if decision == Decision::Retry {
                logging::debug!(
                    "[RetryTransport] Retrying {}, attempt {}, status {:?}, error {:?}",
                    req.uri(),
                    count,
                    attempt.status(),
                    attempt.error
                );
                if let Some(delayer) = &self.delayer {
                    delayer.delay(&attempt);
                }
                count += 1;
                continue;
            }

            let error = cause.and_then(|cause| cause.into_error());
            if decision == Decision::Abort {
                logging::info!(
                    "[RetryTransport] Gave up on {} after {} attempts, cause {:?}",
                    req.uri(),
                    count,
                    error
                );
            }
            return match error {
                Some(error) => Err(error),
                None => outcome,
            };
        }
    }
}
