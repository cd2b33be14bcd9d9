use super::Counter;
use crate::config::MAX_WINDOW_MS;
use crate::utils::{format_time_secs, Clock};
use crate::{logging, Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// `Summary` is a point-in-time aggregate over every retained bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: u64,
    pub errors: u64,
    /// `errors / total`, or `0.0` when nothing was observed
    pub rate: f64,
}

// SlidingWindowMetric is a ring of per-second success/failure counters.
// It is owned by a single circuit breaker control loop, so it takes `&mut self`
// and needs neither locks nor atomics.
// Stale buckets are expired lazily when the cursor advances, there is no background sweep.
pub struct SlidingWindowMetric {
    buckets: Vec<Counter>,
    cursor: usize,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowMetric {
    /// `window` is truncated to whole seconds, one bucket per second.
    /// It must span between 1 second and `MAX_WINDOW_MS`.
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        let seconds = window.as_secs();
        if seconds == 0 {
            return Err(Error::msg(format!(
                "invalid sliding window {:?}: the window must span at least 1 second",
                window
            )));
        }
        if window > Duration::from_millis(MAX_WINDOW_MS) {
            return Err(Error::msg(format!(
                "invalid sliding window {:?}: the window must span at most {} ms",
                window, MAX_WINDOW_MS
            )));
        }
        let len = usize::try_from(seconds)?;
        Ok(SlidingWindowMetric {
            buckets: vec![Counter::default(); len],
            cursor: 0,
            clock,
        })
    }

    /// a new, empty metric with the same window and clock
    pub fn fresh(&self) -> Self {
        SlidingWindowMetric {
            buckets: vec![Counter::default(); self.buckets.len()],
            cursor: 0,
            clock: Arc::clone(&self.clock),
        }
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// `success` records a successful observation in the bucket of the current second.
    /// The latency is not part of the statistic.
    pub fn success(&mut self, latency: Duration) {
        logging::trace!("[SlidingWindowMetric] success, latency {:?}", latency);
        self.current_bucket().success += 1;
    }

    /// `failure` records a failed observation in the bucket of the current second.
    pub fn failure(&mut self, latency: Duration) {
        logging::trace!("[SlidingWindowMetric] failure, latency {:?}", latency);
        self.current_bucket().failure += 1;
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for counter in &self.buckets {
            summary.total += counter.total();
            summary.errors += counter.failure;
        }
        if summary.total > 0 {
            summary.rate = summary.errors as f64 / summary.total as f64;
        }
        summary
    }

    /// The buckets from the oldest to the current one.
    pub fn counters(&self) -> Vec<Counter> {
        let n = self.buckets.len();
        (1..=n)
            .map(|i| self.buckets[(self.cursor + i) % n])
            .collect()
    }

    /// `current_bucket` moves the cursor to the bucket of the current second.
    /// Every bucket the cursor passes over is zeroed and re-stamped, so skipping several
    /// seconds never leaves stale counts behind. When the clock jumps backward, or further
    /// than the window, the whole window is invalidated.
    fn current_bucket(&mut self) -> &mut Counter {
        let now = (self.clock.now_millis() / 1000) as i64;
        let current = self.buckets[self.cursor].second;
        if now != current {
            let n = self.buckets.len() as i64;
            let mut step = now - current;
            if step < 0 || step > n {
                step = n;
            }
            for i in 1..=step {
                self.cursor = (self.cursor + 1) % self.buckets.len();
                self.buckets[self.cursor].reset(now - step + i);
            }
        }
        &mut self.buckets[self.cursor]
    }
}

impl fmt::Debug for SlidingWindowMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindowMetric")
            .field("buckets", &self.counters())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl fmt::Display for SlidingWindowMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, counter) in self.counters().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(
                f,
                "{}:{}/{}",
                format_time_secs(counter.second),
                counter.success,
                counter.failure
            )?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::ManualClock;

    const T: u64 = 1_600_000_000_000;

    fn metric(seconds: u64) -> (Arc<ManualClock>, SlidingWindowMetric) {
        let clock = Arc::new(ManualClock::new(T));
        let metric =
            SlidingWindowMetric::new(Duration::from_secs(seconds), clock.clone()).unwrap();
        (clock, metric)
    }

    #[test]
    fn reject_sub_second_window() {
        let clock = Arc::new(ManualClock::new(T));
        assert!(SlidingWindowMetric::new(Duration::from_millis(999), clock.clone()).is_err());
        assert!(SlidingWindowMetric::new(Duration::ZERO, clock).is_err());
    }

    #[test]
    fn reject_oversized_window() {
        let clock = Arc::new(ManualClock::new(T));
        let hour = Duration::from_millis(MAX_WINDOW_MS);
        let metric = SlidingWindowMetric::new(hour, clock.clone()).unwrap();
        assert_eq!(metric.bucket_count(), 3600);
        assert!(SlidingWindowMetric::new(hour + Duration::from_secs(1), clock.clone()).is_err());
        assert!(SlidingWindowMetric::new(Duration::from_millis(u64::MAX), clock).is_err());
    }

    #[test]
    fn empty_summary() {
        let (_, metric) = metric(5);
        assert_eq!(metric.bucket_count(), 5);
        assert_eq!(metric.summary(), Summary::default());
    }

    #[test]
    fn same_second() {
        let (_, mut metric) = metric(5);
        metric.success(Duration::ZERO);
        metric.success(Duration::ZERO);
        metric.failure(Duration::ZERO);
        let summary = metric.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.errors, 1);
        assert!((summary.rate - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sums_across_the_window() {
        let (clock, mut metric) = metric(5);
        for _ in 0..5 {
            metric.success(Duration::ZERO);
            metric.failure(Duration::ZERO);
            clock.advance(Duration::from_secs(1));
        }
        let summary = metric.summary();
        assert_eq!(summary.total, 10);
        assert_eq!(summary.errors, 5);
        assert_eq!(summary.rate, 0.5);

        // the sixth second pushes out the first one
        metric.failure(Duration::ZERO);
        let summary = metric.summary();
        assert_eq!(summary.total, 9);
        assert_eq!(summary.errors, 5);
    }

    #[test]
    fn gap_beyond_window_zeroes_everything() {
        let (clock, mut metric) = metric(5);
        metric.failure(Duration::ZERO);
        clock.advance(Duration::from_secs(1));
        metric.failure(Duration::ZERO);
        assert_eq!(metric.summary().errors, 2);

        clock.advance(Duration::from_secs(6));
        metric.failure(Duration::ZERO);
        let summary = metric.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.rate, 1.0);
    }

    #[test]
    fn skipped_seconds_are_zeroed() {
        let (clock, mut metric) = metric(5);
        metric.failure(Duration::ZERO);
        clock.advance(Duration::from_secs(3));
        metric.success(Duration::ZERO);
        let counters = metric.counters();
        let now = (T / 1000) as i64 + 3;
        let stamps: Vec<i64> = counters.iter().map(|c| c.second()).collect();
        assert_eq!(stamps, vec![now - 4, now - 3, now - 2, now - 1, now]);
        let totals: Vec<u64> = counters.iter().map(|c| c.total()).collect();
        assert_eq!(totals, vec![0, 1, 0, 0, 1]);
    }

    #[test]
    fn clock_backward_invalidates_the_window() {
        let (clock, mut metric) = metric(5);
        metric.failure(Duration::ZERO);
        metric.failure(Duration::ZERO);
        clock.set_millis(T - 2_000);
        metric.success(Duration::ZERO);
        let summary = metric.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.errors, 0);
        // at most one bucket per second
        let mut stamps: Vec<i64> = metric.counters().iter().map(|c| c.second()).collect();
        stamps.dedup();
        assert_eq!(stamps.len(), 5);
        assert_eq!(*stamps.last().unwrap(), (T / 1000) as i64 - 2);
    }

    #[test]
    fn fresh_metric_is_empty() {
        let (_, mut metric) = metric(3);
        metric.failure(Duration::ZERO);
        let fresh = metric.fresh();
        assert_eq!(fresh.bucket_count(), 3);
        assert_eq!(fresh.summary(), Summary::default());
        assert_eq!(metric.summary().errors, 1);
    }

    #[test]
    fn single_bucket_window() {
        let (clock, mut metric) = metric(1);
        metric.failure(Duration::ZERO);
        clock.advance(Duration::from_secs(1));
        metric.success(Duration::ZERO);
        assert_eq!(metric.summary().total, 1);
        assert_eq!(metric.summary().errors, 0);
    }

    #[test]
    fn display() {
        let clock = Arc::new(ManualClock::new(0));
        let mut metric = SlidingWindowMetric::new(Duration::from_secs(2), clock).unwrap();
        metric.success(Duration::ZERO);
        metric.failure(Duration::ZERO);
        assert_eq!(format!("{}", metric), "[00:00:00:0/0 00:00:00:1/1]");
    }
}
