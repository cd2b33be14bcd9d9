use super::Attempt;
use std::time::Duration;

/// `Delayer` waits between two attempts.
pub trait Delayer<Q, S>: Send + Sync {
    fn delay(&self, attempt: &Attempt<'_, Q, S>);
}

impl<Q, S, F> Delayer<Q, S> for F
where
    F: Fn(&Attempt<'_, Q, S>) + Send + Sync,
{
    fn delay(&self, attempt: &Attempt<'_, Q, S>) {
        self(attempt)
    }
}

/// Backoff strategies, computed from the count of the attempt that just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// always the same delay
    Constant(Duration),
    /// `delta * count`
    Linear(Duration),
    /// `base * e^count`
    Exponential(Duration),
    /// `delta * fib(count)`
    Fibonacci(Duration),
}

impl Backoff {
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn duration(&self, count: u32) -> Duration {
        match *self {
            Backoff::Constant(delta) => delta,
            Backoff::Linear(delta) => delta.saturating_mul(count),
            Backoff::Exponential(base) if base.is_zero() => base,
            Backoff::Exponential(base) => {
                Duration::try_from_secs_f64(base.as_secs_f64() * f64::from(count).exp())
                    .unwrap_or(Duration::MAX)
            }
            Backoff::Fibonacci(delta) => {
                delta.saturating_mul(u32::try_from(fib(count)).unwrap_or(u32::MAX))
            }
        }
    }
}

impl<Q, S> Delayer<Q, S> for Backoff {
    fn delay(&self, attempt: &Attempt<'_, Q, S>) {
        std::thread::sleep(self.duration(attempt.count));
    }
}

/// The `n`-th Fibonacci number, `fib(0) == 0` and `fib(1) == 1`. Saturates at `u64::MAX`.
pub fn fib(n: u32) -> u64 {
    let (mut n0, mut n1) = (0u64, 1u64);
    for _ in 0..n {
        let next = n0.saturating_add(n1);
        n0 = n1;
        n1 = next;
    }
    n0
}
